//! Report reason table
//!
//! Reasons differ only in data, so they live in one ordered table instead of
//! per-variant behavior.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a routine is being flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportReason {
    Inappropriate,
    Spam,
    Misleading,
    Harmful,
    Copyright,
    Impersonation,
    Other,
}

/// Display metadata for one reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasonInfo {
    pub reason: ReportReason,
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// All reasons in presentation order
pub const REPORT_REASONS: [ReasonInfo; 7] = [
    ReasonInfo {
        reason: ReportReason::Inappropriate,
        id: "inappropriate",
        label: "Inappropriate Content",
        description: "Contains offensive language, explicit content, or inappropriate material",
    },
    ReasonInfo {
        reason: ReportReason::Spam,
        id: "spam",
        label: "Spam or Scam",
        description: "Promotional content, repetitive posts, or scam attempts",
    },
    ReasonInfo {
        reason: ReportReason::Misleading,
        id: "misleading",
        label: "Misleading Information",
        description: "False or misleading health claims or information",
    },
    ReasonInfo {
        reason: ReportReason::Harmful,
        id: "harmful",
        label: "Harmful or Dangerous",
        description: "Promotes dangerous practices or could cause harm",
    },
    ReasonInfo {
        reason: ReportReason::Copyright,
        id: "copyright",
        label: "Copyright Violation",
        description: "Uses copyrighted material without permission",
    },
    ReasonInfo {
        reason: ReportReason::Impersonation,
        id: "impersonation",
        label: "Impersonation",
        description: "Pretending to be someone else or a different brand",
    },
    ReasonInfo {
        reason: ReportReason::Other,
        id: "other",
        label: "Other",
        description: "Violates community guidelines in other ways",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown report reason: {0}")]
pub struct UnknownReason(pub String);

impl ReportReason {
    /// Iterate reasons in presentation order
    pub fn all() -> impl Iterator<Item = ReportReason> {
        REPORT_REASONS.iter().map(|info| info.reason)
    }

    pub fn info(self) -> &'static ReasonInfo {
        // Table rows are declared in variant order
        &REPORT_REASONS[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportReason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        REPORT_REASONS
            .iter()
            .find(|info| info.id.eq_ignore_ascii_case(needle))
            .map(|info| info.reason)
            .ok_or_else(|| UnknownReason(s.to_string()))
    }
}
