// Report submission workflow
// Single-flight: at most one outbound report call per workflow instance

pub mod state;
pub mod state_machine;

pub use state::{Phase, PhaseTransition, WorkflowState};
pub use state_machine::{ReportWorkflow, SubmitOutcome};
