//! Property tests for submission gating and details normalization

use proptest::prelude::*;
use routine_report::{
    InMemoryModerationStore, InvalidStateReason, Phase, ReportReason, ReportRequest,
    ReportWorkflow, RoutineTarget, WorkflowError, WorkflowState, REPORT_REASONS,
};
use std::sync::Arc;

fn any_reason() -> impl Strategy<Value = ReportReason> {
    (0..REPORT_REASONS.len()).prop_map(|index| REPORT_REASONS[index].reason)
}

fn any_phase() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::Idle),
        Just(Phase::Submitting),
        Just(Phase::Succeeded),
        ".{0,12}".prop_map(|message| Phase::Failed { message }),
    ]
}

proptest! {
    #[test]
    fn no_reason_never_submits(details in ".{0,64}", phase in any_phase()) {
        let state = WorkflowState {
            selected_reason: None,
            details_text: details,
            phase,
            ..Default::default()
        };
        prop_assert!(!state.can_submit());
    }

    #[test]
    fn submitting_never_submits(reason in proptest::option::of(any_reason()), details in ".{0,64}") {
        let state = WorkflowState {
            selected_reason: reason,
            details_text: details,
            phase: Phase::Submitting,
            ..Default::default()
        };
        prop_assert!(!state.can_submit());
    }

    #[test]
    fn blank_details_are_absent(reason in any_reason(), details in "[ \t\r\n]{0,16}") {
        let request = ReportRequest::new("routine-1", reason, &details);
        prop_assert_eq!(request.details, None);
    }

    #[test]
    fn other_details_are_kept_verbatim(
        reason in any_reason(),
        details in "[ \t]{0,3}[a-zA-Z0-9!?.,'-]{1,24}( [a-zA-Z0-9]{1,8}){0,3}[ \t\n]{0,3}",
    ) {
        let request = ReportRequest::new("routine-1", reason, &details);
        prop_assert_eq!(request.details, Some(details));
    }

    #[test]
    fn direct_submit_without_reason_is_refused(details in ".{0,32}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let store = Arc::new(InMemoryModerationStore::new());
        let workflow = ReportWorkflow::new(RoutineTarget::new("routine-1", "Leg Day"), store.clone()).unwrap();
        workflow.update_details(details);

        let result = runtime.block_on(workflow.submit());

        prop_assert_eq!(
            result.unwrap_err(),
            WorkflowError::InvalidState { reason: InvalidStateReason::NoReasonSelected }
        );
        prop_assert_eq!(workflow.phase(), Phase::Idle);
        prop_assert!(runtime.block_on(store.reports()).is_empty());
    }
}
