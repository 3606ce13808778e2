// Report workflow state machine
// Idle -> Submitting -> {Succeeded | Failed -> Idle}

use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::errors::{InvalidStateReason, SubmitError, WorkflowError};
use crate::reasons::ReportReason;
use crate::report::{ReportRequest, RoutineTarget};
use crate::submitter::ReportSubmitter;
use crate::telemetry::{create_report_span, generate_correlation_id};
use crate::workflows::state::{Phase, PhaseTransition, WorkflowState};

/// How a submission attempt resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed { message: String },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded)
    }
}

/// Drives one report screen session for a single routine.
///
/// All state lives in a `watch` channel: edits and the single-flight check
/// are atomic read-modify-writes on it, and the screen layer can subscribe to
/// re-render on every change. The outbound call is awaited without holding
/// any lock.
pub struct ReportWorkflow {
    target: RoutineTarget,
    submitter: Arc<dyn ReportSubmitter>,
    state: Arc<watch::Sender<WorkflowState>>,
}

impl std::fmt::Debug for ReportWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportWorkflow")
            .field("target", &self.target)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl ReportWorkflow {
    pub fn new(
        target: RoutineTarget,
        submitter: Arc<dyn ReportSubmitter>,
    ) -> Result<Self, WorkflowError> {
        if target.id.trim().is_empty() {
            return Err(WorkflowError::MissingRoutineId);
        }

        let (state, _) = watch::channel(WorkflowState::default());
        Ok(Self {
            target,
            submitter,
            state: Arc::new(state),
        })
    }

    pub fn target(&self) -> &RoutineTarget {
        &self.target
    }

    /// Select a reason, replacing any previous one. Ignored while frozen.
    pub fn select_reason(&self, reason: ReportReason) {
        self.state.send_if_modified(|state| {
            if !state.accepts_edits() {
                debug!(reason = reason.id(), phase = state.phase.name(), "Ignoring reason change");
                return false;
            }
            if state.selected_reason == Some(reason) {
                return false;
            }
            state.selected_reason = Some(reason);
            true
        });
    }

    /// Replace the details text verbatim. Ignored while frozen.
    pub fn update_details(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_if_modified(|state| {
            if !state.accepts_edits() {
                debug!(phase = state.phase.name(), "Ignoring details change");
                return false;
            }
            if state.details_text == text {
                return false;
            }
            state.details_text = text;
            true
        });
    }

    pub fn can_submit(&self) -> bool {
        self.state.borrow().can_submit()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase.clone()
    }

    pub fn selected_reason(&self) -> Option<ReportReason> {
        self.state.borrow().selected_reason
    }

    pub fn details_text(&self) -> String {
        self.state.borrow().details_text.clone()
    }

    pub fn snapshot(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn history(&self) -> Vec<PhaseTransition> {
        self.state.borrow().history.clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Message of the last failed attempt; returned once, then cleared
    pub fn take_failure_message(&self) -> Option<String> {
        let mut taken = None;
        self.state.send_if_modified(|state| {
            taken = state.failure_message.take();
            taken.is_some()
        });
        taken
    }

    /// Submit the report and wait for the backend to answer.
    ///
    /// Backend failures are folded into `SubmitOutcome::Failed`; only caller
    /// errors come back as `Err`, and those never reach the backend.
    pub async fn submit(&self) -> Result<SubmitOutcome, WorkflowError> {
        let request = self.begin()?;
        let correlation_id = generate_correlation_id();
        let span = create_report_span("submit_report", &request.routine_id, &correlation_id);

        let outcome = async {
            let mut guard = InFlightGuard::new(&self.state);
            let result = self.submitter.submit_report(&request).await;
            guard.disarm();
            resolve(&self.state, &request, result)
        }
        .instrument(span)
        .await;

        Ok(outcome)
    }

    /// Start a submission on a background task.
    ///
    /// The single-flight check happens before this returns. If the workflow
    /// is dropped before the backend answers, the result is discarded and the
    /// task yields `None`. If the task is aborted first, the workflow returns
    /// to `Idle`.
    pub fn submit_detached(&self) -> Result<JoinHandle<Option<SubmitOutcome>>, WorkflowError> {
        let runtime = Handle::try_current().map_err(|_| WorkflowError::NoRuntime)?;
        let request = self.begin()?;
        let correlation_id = generate_correlation_id();
        let span = create_report_span("submit_report", &request.routine_id, &correlation_id);
        let state: Weak<watch::Sender<WorkflowState>> = Arc::downgrade(&self.state);
        let mut guard = InFlightGuard::new(&self.state);
        let submitter = Arc::clone(&self.submitter);

        Ok(runtime.spawn(
            async move {
                let result = submitter.submit_report(&request).await;
                guard.disarm();
                match state.upgrade() {
                    Some(state) => Some(resolve(&state, &request, result)),
                    None => {
                        debug!(
                            routine_id = %request.routine_id,
                            "Report workflow discarded before completion, dropping result"
                        );
                        None
                    }
                }
            }
            .instrument(span),
        ))
    }

    /// Atomically enter `Submitting` and snapshot the request
    fn begin(&self) -> Result<ReportRequest, WorkflowError> {
        let mut begun = Err(InvalidStateReason::SubmissionInFlight);
        self.state.send_if_modified(|state| {
            begun = begin_submission(state, &self.target.id);
            begun.is_ok()
        });

        match begun {
            Ok(request) => {
                info!(
                    routine_id = %request.routine_id,
                    reason = request.reason.id(),
                    has_details = request.details.is_some(),
                    "Report submission started"
                );
                Ok(request)
            }
            Err(reason) => {
                warn!(%reason, "Rejected report submission");
                Err(WorkflowError::InvalidState { reason })
            }
        }
    }
}

fn begin_submission(
    state: &mut WorkflowState,
    routine_id: &str,
) -> Result<ReportRequest, InvalidStateReason> {
    match state.phase {
        Phase::Submitting => return Err(InvalidStateReason::SubmissionInFlight),
        Phase::Succeeded => return Err(InvalidStateReason::AlreadySubmitted),
        Phase::Idle | Phase::Failed { .. } => {}
    }
    let reason = state
        .selected_reason
        .ok_or(InvalidStateReason::NoReasonSelected)?;

    let request = ReportRequest::new(routine_id, reason, &state.details_text);
    state.failure_message = None;
    state.transition(Phase::Submitting);
    Ok(request)
}

fn resolve(
    state: &watch::Sender<WorkflowState>,
    request: &ReportRequest,
    result: Result<(), SubmitError>,
) -> SubmitOutcome {
    match result {
        Ok(()) => {
            info!(routine_id = %request.routine_id, "Report submitted");
            state.send_modify(|state| state.transition(Phase::Succeeded));
            SubmitOutcome::Succeeded
        }
        Err(err) => {
            let message = err.user_message();
            warn!(
                routine_id = %request.routine_id,
                transport = err.is_transport(),
                error = %err,
                "Report submission failed"
            );
            state.send_modify(|state| {
                state.transition(Phase::Failed {
                    message: message.clone(),
                });
                state.failure_message = Some(message.clone());
                state.transition(Phase::Idle);
            });
            SubmitOutcome::Failed { message }
        }
    }
}

/// Returns the workflow to `Idle` if a submission is dropped or aborted
/// before the backend answers
struct InFlightGuard {
    state: Weak<watch::Sender<WorkflowState>>,
    armed: bool,
}

impl InFlightGuard {
    fn new(state: &Arc<watch::Sender<WorkflowState>>) -> Self {
        Self {
            state: Arc::downgrade(state),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        state.send_if_modified(|state| {
            if !state.phase.is_submitting() {
                return false;
            }
            warn!("Report submission abandoned before the backend answered");
            state.transition(Phase::Idle);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{GENERIC_FAILURE_MESSAGE, TRANSPORT_FAILURE_MESSAGE};
    use crate::submitter::MockReportSubmitter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn target() -> RoutineTarget {
        RoutineTarget::new("routine-42", "Morning Stretch").with_creator("Test User")
    }

    fn workflow_with(mock: MockReportSubmitter) -> ReportWorkflow {
        ReportWorkflow::new(target(), Arc::new(mock)).unwrap()
    }

    /// Holds every call until released
    #[derive(Default)]
    struct GatedSubmitter {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl ReportSubmitter for GatedSubmitter {
        async fn submit_report(&self, _request: &ReportRequest) -> Result<(), SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(())
        }
    }

    #[test]
    fn test_rejects_empty_routine_id() {
        let mock = MockReportSubmitter::new();
        let err = ReportWorkflow::new(RoutineTarget::new("  ", "Nameless"), Arc::new(mock))
            .unwrap_err();
        assert_eq!(err, WorkflowError::MissingRoutineId);
    }

    #[test]
    fn test_selection_and_details_editing() {
        let workflow = workflow_with(MockReportSubmitter::new());
        assert!(!workflow.can_submit());

        workflow.update_details("some context");
        assert!(!workflow.can_submit());

        workflow.select_reason(ReportReason::Spam);
        workflow.select_reason(ReportReason::Harmful);
        assert_eq!(workflow.selected_reason(), Some(ReportReason::Harmful));
        assert_eq!(workflow.details_text(), "some context");
        assert!(workflow.can_submit());
    }

    #[tokio::test]
    async fn test_submit_without_reason_makes_no_call() {
        let mut mock = MockReportSubmitter::new();
        mock.expect_submit_report().times(0);
        let workflow = workflow_with(mock);

        let err = workflow.submit().await.unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidState {
                reason: InvalidStateReason::NoReasonSelected
            }
        );
        assert_eq!(workflow.phase(), Phase::Idle);
        assert!(workflow.history().is_empty());
    }

    #[tokio::test]
    async fn test_success_is_terminal() {
        let mut mock = MockReportSubmitter::new();
        mock.expect_submit_report()
            .withf(|request| {
                request.routine_id == "routine-42"
                    && request.reason == ReportReason::Spam
                    && request.details.is_none()
            })
            .times(1)
            .returning(|_| Ok(()));
        let workflow = workflow_with(mock);

        workflow.select_reason(ReportReason::Spam);
        let outcome = workflow.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert_eq!(workflow.phase(), Phase::Succeeded);

        workflow.select_reason(ReportReason::Other);
        workflow.update_details("changed my mind");
        assert_eq!(workflow.selected_reason(), Some(ReportReason::Spam));
        assert_eq!(workflow.details_text(), "");
        assert!(!workflow.can_submit());

        let err = workflow.submit().await.unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidState {
                reason: InvalidStateReason::AlreadySubmitted
            }
        );
        assert_eq!(workflow.phase(), Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_failure_resets_to_idle_and_keeps_input() {
        let mut mock = MockReportSubmitter::new();
        mock.expect_submit_report()
            .times(1)
            .returning(|_| Err(SubmitError::transport("operation timed out")));
        let workflow = workflow_with(mock);

        workflow.select_reason(ReportReason::Inappropriate);
        workflow.update_details("contains slurs");
        let outcome = workflow.submit().await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: TRANSPORT_FAILURE_MESSAGE.to_string()
            }
        );
        assert_eq!(workflow.phase(), Phase::Idle);
        assert_eq!(workflow.selected_reason(), Some(ReportReason::Inappropriate));
        assert_eq!(workflow.details_text(), "contains slurs");
        assert!(workflow.can_submit());

        let phases: Vec<&str> = workflow.history().iter().map(|t| t.to.name()).collect();
        assert_eq!(phases, vec!["submitting", "failed", "idle"]);
    }

    #[tokio::test]
    async fn test_failure_message_is_shown_once() {
        let mut mock = MockReportSubmitter::new();
        mock.expect_submit_report().times(1).returning(|_| {
            Err(SubmitError::Rejected {
                status: Some(500),
                message: None,
            })
        });
        let workflow = workflow_with(mock);

        workflow.select_reason(ReportReason::Copyright);
        workflow.submit().await.unwrap();

        assert_eq!(
            workflow.take_failure_message(),
            Some(GENERIC_FAILURE_MESSAGE.to_string())
        );
        assert_eq!(workflow.take_failure_message(), None);
    }

    #[tokio::test]
    async fn test_retry_after_failure_issues_fresh_call() {
        let mut mock = MockReportSubmitter::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_submit_report()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SubmitError::rejected("Routine not found")));
        mock.expect_submit_report()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let workflow = workflow_with(mock);

        workflow.select_reason(ReportReason::Misleading);
        let first = workflow.submit().await.unwrap();
        assert_eq!(
            first,
            SubmitOutcome::Failed {
                message: "Routine not found".to_string()
            }
        );

        let second = workflow.submit().await.unwrap();
        assert!(second.is_success());
        assert_eq!(workflow.take_failure_message(), None);
    }

    #[tokio::test]
    async fn test_double_submit_is_rejected_while_in_flight() {
        let submitter = Arc::new(GatedSubmitter::default());
        let workflow = ReportWorkflow::new(target(), submitter.clone()).unwrap();
        workflow.select_reason(ReportReason::Spam);

        let (first, second) = tokio::join!(workflow.submit(), async {
            assert!(workflow.phase().is_submitting());
            assert!(!workflow.can_submit());

            workflow.select_reason(ReportReason::Other);
            workflow.update_details("late edit");
            let second = workflow.submit().await;

            submitter.release.notify_one();
            second
        });

        assert_eq!(first.unwrap(), SubmitOutcome::Succeeded);
        assert_eq!(
            second.unwrap_err(),
            WorkflowError::InvalidState {
                reason: InvalidStateReason::SubmissionInFlight
            }
        );
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(workflow.selected_reason(), Some(ReportReason::Spam));
        assert_eq!(workflow.details_text(), "");
    }

    #[tokio::test]
    async fn test_dropped_submit_future_returns_to_idle() {
        let submitter = Arc::new(GatedSubmitter::default());
        let workflow = ReportWorkflow::new(target(), submitter.clone()).unwrap();
        workflow.select_reason(ReportReason::Spam);

        let attempt = tokio::time::timeout(std::time::Duration::from_millis(10), workflow.submit());
        assert!(attempt.await.is_err());

        assert_eq!(workflow.phase(), Phase::Idle);
        assert!(workflow.can_submit());
        assert_eq!(workflow.take_failure_message(), None);
    }

    #[tokio::test]
    async fn test_detached_completion_after_discard_is_noop() {
        let submitter = Arc::new(GatedSubmitter::default());
        let workflow = ReportWorkflow::new(target(), submitter.clone()).unwrap();
        workflow.select_reason(ReportReason::Harmful);

        let handle = workflow.submit_detached().unwrap();
        drop(workflow);
        submitter.release.notify_one();

        assert_eq!(handle.await.unwrap(), None);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_aborted_detached_submission_returns_to_idle() {
        let submitter = Arc::new(GatedSubmitter::default());
        let workflow = ReportWorkflow::new(target(), submitter.clone()).unwrap();
        workflow.select_reason(ReportReason::Spam);

        let handle = workflow.submit_detached().unwrap();
        tokio::task::yield_now().await;
        assert!(workflow.phase().is_submitting());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert_eq!(workflow.phase(), Phase::Idle);
        assert!(workflow.can_submit());
        assert_eq!(workflow.selected_reason(), Some(ReportReason::Spam));

        let retry = workflow.submit_detached().unwrap();
        submitter.release.notify_one();
        assert_eq!(retry.await.unwrap(), Some(SubmitOutcome::Succeeded));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_detached_submission_needs_a_runtime() {
        let mut mock = MockReportSubmitter::new();
        mock.expect_submit_report().times(0);
        let workflow = workflow_with(mock);
        workflow.select_reason(ReportReason::Spam);

        let err = workflow.submit_detached().unwrap_err();

        assert_eq!(err, WorkflowError::NoRuntime);
        assert_eq!(workflow.phase(), Phase::Idle);
        assert!(workflow.can_submit());
    }

    #[tokio::test]
    async fn test_detached_completion_updates_live_workflow() {
        let mut mock = MockReportSubmitter::new();
        mock.expect_submit_report().times(1).returning(|_| Ok(()));
        let workflow = workflow_with(mock);
        workflow.select_reason(ReportReason::Impersonation);

        let mut updates = workflow.subscribe();
        let handle = workflow.submit_detached().unwrap();
        assert!(workflow.phase().is_submitting());

        let state = updates
            .wait_for(|state| state.phase.is_succeeded())
            .await
            .unwrap()
            .clone();
        assert_eq!(state.selected_reason, Some(ReportReason::Impersonation));
        assert_eq!(handle.await.unwrap(), Some(SubmitOutcome::Succeeded));
    }
}
