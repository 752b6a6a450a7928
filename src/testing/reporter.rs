//! Test transcript output
//!
//! Reporters only render lines; they never decide the verdict. Lines are
//! written immediately, so call order is transcript order.

use std::io::Write;
use std::sync::Mutex;

use colored::Colorize;

/// Category of a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Info,
    Debug,
    Setup,
    Teardown,
    Status,
    Failure,
    SuccessSummary,
    FailureSummary,
    Error,
}

/// Sink for transcript lines
pub trait Reporter: Send + Sync {
    fn report(&self, category: Category, text: &str);
}

/// Colored console output
pub struct ConsoleReporter {
    debug: bool,
}

impl ConsoleReporter {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, category: Category, text: &str) {
        let line = match category {
            Category::Info => text.blue().to_string(),
            Category::Debug => {
                if !self.debug {
                    return;
                }
                format!("[debug] {}", text).as_str().dimmed().to_string()
            }
            Category::Setup | Category::Teardown => format!("  {}", text.cyan()),
            Category::Status => format!("  {}", text),
            Category::Failure => format!("  {} {}", "✗".red(), text.red()),
            Category::SuccessSummary => format!("{} {}", "✓".green().bold(), text.green().bold()),
            Category::FailureSummary => format!("{} {}", "✗".red().bold(), text.red().bold()),
            Category::Error => format!("{} {}", "Error:".red().bold(), text),
        };

        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }
}

/// Records the transcript in memory
#[derive(Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Category, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn lines(&self) -> Vec<(Category, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Lines of one category, in order
    pub fn lines_of(&self, category: Category) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, text)| text)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, category: Category, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((category, text.to_string()));
        }
    }
}
