use thiserror::Error;

/// Shown when the moderation service could not be reached
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Couldn't reach the moderation service. Check your connection and try again.";

/// Shown when a failure carries no human-readable text of its own
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while submitting your report. Please try again.";

/// Why a `submit` call was refused before any outbound call was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateReason {
    NoReasonSelected,
    SubmissionInFlight,
    AlreadySubmitted,
}

impl std::fmt::Display for InvalidStateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidStateReason::NoReasonSelected => write!(f, "no report reason selected"),
            InvalidStateReason::SubmissionInFlight => write!(f, "a submission is already in flight"),
            InvalidStateReason::AlreadySubmitted => write!(f, "the report was already submitted"),
        }
    }
}

/// Caller errors raised by the report workflow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Invalid workflow state: {reason}")]
    InvalidState { reason: InvalidStateReason },

    #[error("Routine id must not be empty")]
    MissingRoutineId,

    #[error("Background submission requires a Tokio runtime")]
    NoRuntime,
}

/// Failures from the outbound report call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The backend could not be reached (connectivity, timeout)
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The backend answered and refused the report
    #[error("Report rejected (status {:?}): {}", .status, .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("Unexpected failure: {message}")]
    Unexpected { message: String },
}

impl SubmitError {
    pub fn transport(message: impl Into<String>) -> Self {
        SubmitError::Transport {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        SubmitError::Rejected {
            status: None,
            message: Some(message.into()),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SubmitError::Transport { .. })
    }

    /// Text suitable for showing to the person who filed the report
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Transport { .. } => TRANSPORT_FAILURE_MESSAGE.to_string(),
            SubmitError::Rejected { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string(),
            SubmitError::Unexpected { message } => {
                if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message.trim().to_string()
                }
            }
        }
    }
}

impl From<anyhow::Error> for SubmitError {
    fn from(err: anyhow::Error) -> Self {
        SubmitError::Unexpected {
            message: err.to_string(),
        }
    }
}
