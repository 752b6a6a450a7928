//! Electric Imp Build API
//!
//! The test pipeline only needs three operations from the build service:
//! upload a revision, restart the model, and read the device log feed.
//! They sit behind [`BuildService`] so the pipeline can run against any
//! conforming backend.

pub mod client;
pub mod types;

pub use client::BuildApiClient;
pub use types::*;

use async_trait::async_trait;

use crate::common::Result;

/// Operations the test runner depends on
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Upload agent and device code as a new revision of the model
    async fn create_revision(
        &self,
        model_id: &str,
        device_code: &str,
        agent_code: &str,
    ) -> Result<Revision>;

    /// Restart every device running the model
    async fn restart_model(&self, model_id: &str) -> Result<()>;

    /// Fetch all log entries with a timestamp at or after `since`
    ///
    /// Consecutive calls may return overlapping entries.
    async fn get_logs(&self, device_id: &str, since: &str) -> Result<Vec<LogEntry>>;
}
