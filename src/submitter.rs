//! Outbound report call
//!
//! This abstraction keeps the workflow independent of how reports reach the
//! moderation backend, so tests can swap in mocks without network access.

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::errors::SubmitError;
use crate::report::ReportRequest;

/// Delivers one report to the moderation backend
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ReportSubmitter: Send + Sync {
    /// Submit a report. Called at most once per workflow attempt, never retried.
    async fn submit_report(&self, request: &ReportRequest) -> Result<(), SubmitError>;
}
