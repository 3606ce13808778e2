//! In-process moderation backend
//!
//! Behaves like the hosted report service: the reporter must be signed in,
//! the routine must exist, each accepted report is stored as a pending record
//! and bumps the routine's report counter. Useful for local development and
//! for exercising the workflow end to end without a network.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::SubmitError;
use crate::report::{Report, ReportRequest};
use crate::submitter::ReportSubmitter;

#[derive(Debug, Clone, Default)]
struct StoredRoutine {
    created_by: Option<String>,
    report_count: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryModerationStore {
    reporter_id: RwLock<Option<String>>,
    routines: RwLock<HashMap<String, StoredRoutine>>,
    reports: RwLock<Vec<Report>>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity that subsequent reports are filed under
    pub async fn sign_in(&self, reporter_id: impl Into<String>) {
        *self.reporter_id.write().await = Some(reporter_id.into());
    }

    pub async fn sign_out(&self) {
        *self.reporter_id.write().await = None;
    }

    pub async fn register_routine(&self, routine_id: impl Into<String>, created_by: Option<&str>) {
        self.routines.write().await.insert(
            routine_id.into(),
            StoredRoutine {
                created_by: created_by.map(str::to_string),
                report_count: 0,
            },
        );
    }

    pub async fn reports(&self) -> Vec<Report> {
        self.reports.read().await.clone()
    }

    pub async fn reports_for(&self, routine_id: &str) -> Vec<Report> {
        self.reports
            .read()
            .await
            .iter()
            .filter(|report| report.content_id == routine_id)
            .cloned()
            .collect()
    }

    /// Number of reports filed against a routine, `None` if it is unknown
    pub async fn report_count(&self, routine_id: &str) -> Option<u64> {
        self.routines
            .read()
            .await
            .get(routine_id)
            .map(|routine| routine.report_count)
    }
}

#[async_trait]
impl ReportSubmitter for InMemoryModerationStore {
    async fn submit_report(&self, request: &ReportRequest) -> Result<(), SubmitError> {
        let reporter_id = self
            .reporter_id
            .read()
            .await
            .clone()
            .ok_or_else(|| SubmitError::Rejected {
                status: Some(401),
                message: Some("User not authenticated".to_string()),
            })?;

        let mut routines = self.routines.write().await;
        let routine = routines
            .get_mut(&request.routine_id)
            .ok_or_else(|| SubmitError::Rejected {
                status: Some(404),
                message: Some("Routine not found".to_string()),
            })?;

        let report = Report::for_routine(
            Uuid::new_v4().to_string(),
            reporter_id,
            request,
            routine.created_by.clone().unwrap_or_default(),
            Utc::now(),
        );
        routine.report_count += 1;

        info!(
            report_id = %report.id,
            routine_id = %request.routine_id,
            reason = request.reason.id(),
            report_count = routine.report_count,
            "Stored routine report"
        );
        self.reports.write().await.push(report);
        Ok(())
    }
}
