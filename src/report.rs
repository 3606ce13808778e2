use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reasons::ReportReason;

/// The routine being reported, as shown on the report screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineTarget {
    pub id: String,
    pub name: String,
    pub creator_display_name: Option<String>,
}

impl RoutineTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            creator_display_name: None,
        }
    }

    pub fn with_creator(mut self, creator_display_name: impl Into<String>) -> Self {
        self.creator_display_name = Some(creator_display_name.into());
        self
    }
}

/// Outbound payload for one report attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub routine_id: String,
    pub reason: ReportReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ReportRequest {
    /// Build a request from raw editor text.
    ///
    /// Empty or whitespace-only text becomes `None`; anything else is kept
    /// verbatim, surrounding whitespace included.
    pub fn new(routine_id: impl Into<String>, reason: ReportReason, details_text: &str) -> Self {
        Self {
            routine_id: routine_id.into(),
            reason,
            details: normalize_details(details_text),
        }
    }
}

pub fn normalize_details(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Kinds of content a report can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Routine,
    Comment,
    Review,
    User,
}

impl ContentType {
    pub fn display_name(self) -> &'static str {
        match self {
            ContentType::Routine => "Routine",
            ContentType::Comment => "Comment",
            ContentType::Review => "Review",
            ContentType::User => "User Profile",
        }
    }
}

/// Moderation status of a stored report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewing,
    Resolved,
    Dismissed,
    Escalated,
}

impl ReportStatus {
    pub fn display_name(self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending Review",
            ReportStatus::Reviewing => "Under Review",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Dismissed => "Dismissed",
            ReportStatus::Escalated => "Escalated",
        }
    }
}

/// Action a moderator took when resolving a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeratorAction {
    ContentRemoved,
    ContentApproved,
    ContentEdited,
    UserWarned,
    UserSuspended,
    UserBanned,
    NoAction,
}

impl ModeratorAction {
    pub fn display_name(self) -> &'static str {
        match self {
            ModeratorAction::ContentRemoved => "Content Removed",
            ModeratorAction::ContentApproved => "Content Approved",
            ModeratorAction::ContentEdited => "Content Edited",
            ModeratorAction::UserWarned => "User Warned",
            ModeratorAction::UserSuspended => "User Suspended",
            ModeratorAction::UserBanned => "User Banned",
            ModeratorAction::NoAction => "No Action Taken",
        }
    }

    /// 0 (nothing done) through 5 (account banned)
    pub fn severity(self) -> u8 {
        match self {
            ModeratorAction::NoAction | ModeratorAction::ContentApproved => 0,
            ModeratorAction::ContentEdited => 1,
            ModeratorAction::UserWarned => 2,
            ModeratorAction::ContentRemoved => 3,
            ModeratorAction::UserSuspended => 4,
            ModeratorAction::UserBanned => 5,
        }
    }
}

/// A report as stored by the moderation backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub reporter_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub creator_id: String,
    pub reason: ReportReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_action: Option<ModeratorAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

impl Report {
    /// New pending report against a routine
    pub fn for_routine(
        id: String,
        reporter_id: String,
        request: &ReportRequest,
        creator_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            reporter_id,
            content_id: request.routine_id.clone(),
            content_type: ContentType::Routine,
            creator_id,
            reason: request.reason,
            details: request.details.clone(),
            created_at,
            status: ReportStatus::Pending,
            moderator_id: None,
            moderator_action: None,
            resolution_date: None,
            resolution_notes: None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self.status, ReportStatus::Pending | ReportStatus::Reviewing)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.status, ReportStatus::Resolved | ReportStatus::Dismissed)
    }

    /// Relative age such as "3 hours ago"
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.created_at);
        let days = elapsed.num_days();
        let hours = elapsed.num_hours();

        if days > 0 {
            plural(days, "day")
        } else if hours > 0 {
            plural(hours, "hour")
        } else {
            plural(elapsed.num_minutes().max(0), "minute")
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
