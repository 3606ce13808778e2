// Routine Report Library - report submission workflow for shared routines
// This exposes the workflow, its outbound seam, and the supporting stack

pub mod config;
pub mod errors;
pub mod http;
pub mod reasons;
pub mod report;
pub mod store;
pub mod submitter;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{config, init_config, RoutineReportConfig};
pub use errors::{InvalidStateReason, SubmitError, WorkflowError};
pub use http::HttpReportSubmitter;
pub use reasons::{ReasonInfo, ReportReason, REPORT_REASONS};
pub use report::{ContentType, ModeratorAction, Report, ReportRequest, ReportStatus, RoutineTarget};
pub use store::InMemoryModerationStore;
pub use submitter::ReportSubmitter;
#[cfg(feature = "testing")]
pub use submitter::MockReportSubmitter;
pub use telemetry::{create_report_span, generate_correlation_id, init_telemetry};
pub use workflows::{Phase, PhaseTransition, ReportWorkflow, SubmitOutcome, WorkflowState};
