use chrono::{DateTime, Utc};

use crate::reasons::ReportReason;

/// Most recent phase changes kept per workflow
pub const HISTORY_LIMIT: usize = 32;

/// Stage of one report attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    /// Transient: a failed attempt resets to `Idle` right after being recorded
    Failed { message: String },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Submitting => "submitting",
            Phase::Succeeded => "succeeded",
            Phase::Failed { .. } => "failed",
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Phase::Submitting)
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Phase::Succeeded)
    }
}

/// One recorded phase change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub at: DateTime<Utc>,
}

/// Everything the report screen edits or observes during one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    pub selected_reason: Option<ReportReason>,
    pub details_text: String,
    pub phase: Phase,
    /// Message from the last failed attempt, until the caller takes it
    pub failure_message: Option<String>,
    /// Latest transitions, oldest first, capped at `HISTORY_LIMIT`
    pub history: Vec<PhaseTransition>,
}

impl WorkflowState {
    /// The only gate for enabling submission
    pub fn can_submit(&self) -> bool {
        self.selected_reason.is_some() && self.accepts_edits()
    }

    /// Reason and details are frozen while a request is in flight and once
    /// the report has gone through.
    pub fn accepts_edits(&self) -> bool {
        !matches!(self.phase, Phase::Submitting | Phase::Succeeded)
    }

    pub(crate) fn transition(&mut self, to: Phase) {
        let from = std::mem::replace(&mut self.phase, to.clone());
        tracing::debug!(from = from.name(), to = to.name(), "Report workflow phase changed");
        self.history.push(PhaseTransition {
            from,
            to,
            at: Utc::now(),
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}
