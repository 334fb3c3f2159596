mod common;

use std::sync::Arc;

use common::{memory_cycle, run_step, ScriptedHandler, MONTH};
use payrun_core::{
    models::{initial_metadata, METADATA_PROCESSED},
    store::{keys, MemoryStore},
    verification::post_handoff,
    ActionHandlers, ConfirmOutcome, CycleBuilder, CycleError, ExecutionOutcome, Modal, ModalKind,
    Precondition, RequestOutcome, StepStatus, VerificationEvent, VerificationOutcome,
    VerifyOutcome,
};
use tokio::sync::Notify;

const GATED: &str = "incentive-calculation";

#[tokio::test]
async fn test_fresh_cycle_enables_only_first_step() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    let enabled: Vec<bool> = cycle.steps().iter().map(|s| s.enabled).collect();
    assert_eq!(enabled.len(), 8);
    assert!(enabled[0]);
    assert!(enabled[1..].iter().all(|e| !e));
    assert!(cycle
        .states()
        .iter()
        .all(|s| s.status == StepStatus::Pending && !s.checked && s.metadata == initial_metadata()));
    assert_eq!(cycle.modal(), None);
}

#[tokio::test]
async fn test_submit_requires_acknowledgement() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    let outcome = cycle.request_execute("incentive-validation").unwrap();
    assert_eq!(
        outcome,
        RequestOutcome::Rejected(Precondition::AcknowledgementRequired)
    );
    match cycle.modal() {
        Some(Modal::Error { title, message }) => {
            assert_eq!(title, "Validation Required");
            assert_eq!(
                message,
                "Please check the checkbox to confirm before submitting."
            );
        }
        other => panic!("expected error modal, got {other:?}"),
    }
    assert_eq!(handler.calls(), 0);
    assert_eq!(
        cycle.step("incentive-validation").unwrap().status,
        StepStatus::Pending
    );
}

#[tokio::test]
async fn test_linear_gating_rejects_later_steps() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    let outcome = cycle.request_execute("bank-transfer").unwrap();
    assert!(matches!(
        outcome,
        RequestOutcome::Rejected(Precondition::StepLocked { .. })
    ));
    match cycle.modal() {
        Some(Modal::Error { message, .. }) => assert_eq!(
            message,
            "Please complete all previous steps before running this step."
        ),
        other => panic!("expected error modal, got {other:?}"),
    }
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_completion_enables_next_step() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    let outcome = run_step(&cycle, "incentive-validation").await;
    assert_eq!(
        outcome,
        ConfirmOutcome::Executed(ExecutionOutcome::Completed {
            message: "done".to_string(),
            artifact: None,
        })
    );
    assert_eq!(handler.months(), vec![MONTH.to_string()]);

    let state = cycle.step("incentive-validation").unwrap();
    assert_eq!(state.status, StepStatus::Completed);
    assert!(state.last_run_at.is_some());
    assert_eq!(state.metadata[METADATA_PROCESSED], "10 employees");
    assert_ne!(state.metadata["Last Run"], "Not started");
    assert!(cycle.is_enabled(GATED).unwrap());
    assert!(!cycle.is_enabled("performance-incentive").unwrap());
    assert_eq!(cycle.modal().map(|m| m.kind()), Some(ModalKind::Success));

    // Completed steps cannot be executed again.
    cycle.close_modal();
    assert_eq!(
        cycle.request_execute("incentive-validation").unwrap(),
        RequestOutcome::Rejected(Precondition::AlreadyCompleted)
    );
    assert_eq!(handler.calls(), 1);
}

#[tokio::test]
async fn test_verification_gate_blocks_until_event() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;
    run_step(&cycle, "incentive-validation").await;
    cycle.close_modal();

    let outcome = cycle.request_execute(GATED).unwrap();
    assert!(matches!(
        outcome,
        RequestOutcome::Rejected(Precondition::VerificationPending { .. })
    ));
    match cycle.modal() {
        Some(Modal::Error { message, .. }) => assert_eq!(
            message,
            "Please verify the Incentive Calculation Report before running this step."
        ),
        other => panic!("expected error modal, got {other:?}"),
    }
    // Gating alone still says the step is enabled.
    assert!(cycle.is_enabled(GATED).unwrap());

    let verified = cycle.receive_verification(&VerificationEvent::approved(GATED, None));
    assert_eq!(verified, VerificationOutcome::Verified);
    assert!(cycle.is_verified());
    match cycle.modal() {
        Some(Modal::Success { title, message, .. }) => {
            assert_eq!(title, "Report Verified");
            assert_eq!(
                message,
                "Incentive Calculation Report has been verified. You can now run this step."
            );
        }
        other => panic!("expected success modal, got {other:?}"),
    }

    // Re-delivery is a no-op: no second notification.
    cycle.close_modal();
    let again = cycle.receive_verification(&VerificationEvent::approved(GATED, None));
    assert_eq!(again, VerificationOutcome::AlreadyVerified);
    assert_eq!(cycle.modal(), None);

    assert_eq!(
        cycle.request_execute(GATED).unwrap(),
        RequestOutcome::AwaitingConfirmation
    );
}

#[tokio::test]
async fn test_mismatched_verification_is_ignored() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    let outcome = cycle.receive_verification(&VerificationEvent::approved("bank-transfer", None));
    assert!(matches!(outcome, VerificationOutcome::Mismatched { .. }));
    assert!(!cycle.is_verified());
    assert_eq!(cycle.modal(), None);
}

#[tokio::test]
async fn test_failure_then_retry() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    handler.set_failing(true);
    let outcome = run_step(&cycle, "incentive-validation").await;
    assert!(matches!(
        outcome,
        ConfirmOutcome::Executed(ExecutionOutcome::Failed(_))
    ));
    let state = cycle.step("incentive-validation").unwrap();
    assert_eq!(state.status, StepStatus::Error);
    assert_eq!(state.metadata, initial_metadata());
    assert!(!cycle.is_enabled(GATED).unwrap());
    match cycle.modal() {
        Some(Modal::Error { title, message }) => {
            assert_eq!(title, "Error");
            assert_eq!(message, "backend unavailable");
        }
        other => panic!("expected error modal, got {other:?}"),
    }

    // Errored steps may be re-run; the checkbox is still ticked.
    cycle.close_modal();
    handler.set_failing(false);
    assert_eq!(
        cycle.request_execute("incentive-validation").unwrap(),
        RequestOutcome::AwaitingConfirmation
    );
    let retry = cycle.confirm().await.unwrap();
    assert!(matches!(
        retry,
        ConfirmOutcome::Executed(ExecutionOutcome::Completed { .. })
    ));
    assert_eq!(
        cycle.step("incentive-validation").unwrap().status,
        StepStatus::Completed
    );
    assert_eq!(handler.calls(), 2);
}

#[tokio::test]
async fn test_single_flight_execution() {
    let gate = Arc::new(Notify::new());
    let handler = ScriptedHandler::gated(gate.clone());
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;
    cycle.set_checked("incentive-validation", true).unwrap();
    cycle.request_execute("incentive-validation").unwrap();

    let first = cycle.confirm();
    let second = async {
        tokio::task::yield_now().await;
        let status = cycle.step("incentive-validation").unwrap().status;
        let again = cycle.request_execute("incentive-validation").unwrap();
        let modal = cycle.modal();
        let reset = cycle.request_reset();
        cycle.close_modal();
        gate.notify_one();
        (status, again, modal, reset)
    };
    let (first, (status, again, modal, reset)) = tokio::join!(first, second);

    assert_eq!(status, StepStatus::Running);
    assert_eq!(again, RequestOutcome::AlreadyRunning);
    assert_eq!(modal, None);
    assert_eq!(reset, RequestOutcome::Rejected(Precondition::StepInFlight));
    assert!(matches!(
        first.unwrap(),
        ConfirmOutcome::Executed(ExecutionOutcome::Completed { .. })
    ));
    assert_eq!(handler.calls(), 1);
    assert_eq!(
        cycle.step("incentive-validation").unwrap().status,
        StepStatus::Completed
    );
}

#[tokio::test]
async fn test_run_in_another_session_is_not_repeated() {
    let store = MemoryStore::new();
    let gate = Arc::new(Notify::new());
    let first_handler = ScriptedHandler::gated(gate.clone());
    let first = memory_cycle(store.clone(), &first_handler).await;
    first.set_checked("incentive-validation", true).unwrap();
    first.request_execute("incentive-validation").unwrap();

    let second_handler = ScriptedHandler::new();
    let running = first.confirm();
    let other_session = async {
        tokio::task::yield_now().await;
        let second = memory_cycle(store.clone(), &second_handler).await;
        let status = second.step("incentive-validation").unwrap().status;
        let again = second.request_execute("incentive-validation").unwrap();
        let reset = second.request_reset();
        gate.notify_one();
        (status, again, reset)
    };
    let (outcome, (status, again, reset)) = tokio::join!(running, other_session);

    assert_eq!(status, StepStatus::Running);
    assert_eq!(again, RequestOutcome::AlreadyRunning);
    assert_eq!(reset, RequestOutcome::Rejected(Precondition::StepInFlight));
    assert!(matches!(
        outcome.unwrap(),
        ConfirmOutcome::Executed(ExecutionOutcome::Completed { .. })
    ));
    assert_eq!(first_handler.calls(), 1);
    assert_eq!(second_handler.calls(), 0);

    let reloaded = memory_cycle(store, &second_handler).await;
    assert_eq!(
        reloaded.step("incentive-validation").unwrap().status,
        StepStatus::Completed
    );
}

#[tokio::test]
async fn test_panicking_handler_leaves_step_retryable() {
    let handler = ScriptedHandler::new();
    handler.set_panicking(true);
    let cycle = Arc::new(memory_cycle(MemoryStore::new(), &handler).await);
    cycle.set_checked("incentive-validation", true).unwrap();
    cycle.request_execute("incentive-validation").unwrap();

    let task = tokio::spawn({
        let cycle = cycle.clone();
        async move { cycle.confirm().await }
    });
    let joined = task.await;
    assert!(joined.unwrap_err().is_panic());

    assert_eq!(
        cycle.step("incentive-validation").unwrap().status,
        StepStatus::Error
    );
    assert_eq!(cycle.modal().map(|m| m.kind()), Some(ModalKind::Error));
    cycle.close_modal();

    handler.set_panicking(false);
    assert_eq!(
        cycle.request_execute("incentive-validation").unwrap(),
        RequestOutcome::AwaitingConfirmation
    );
    assert!(matches!(
        cycle.confirm().await.unwrap(),
        ConfirmOutcome::Executed(ExecutionOutcome::Completed { .. })
    ));
    assert_eq!(handler.calls(), 2);
}

#[tokio::test]
async fn test_reset_restores_initial_cycle() {
    let store = MemoryStore::new();
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(store.clone(), &handler).await;
    run_step(&cycle, "incentive-validation").await;
    cycle.receive_verification(&VerificationEvent::approved(GATED, None));
    run_step(&cycle, GATED).await;
    handler.set_failing(true);
    run_step(&cycle, "performance-incentive").await;
    cycle.close_modal();

    assert_eq!(cycle.request_reset(), RequestOutcome::AwaitingConfirmation);
    assert_eq!(cycle.confirm().await.unwrap(), ConfirmOutcome::Reset);

    assert!(cycle
        .states()
        .iter()
        .all(|s| s.status == StepStatus::Pending
            && !s.checked
            && s.last_run_at.is_none()
            && s.metadata == initial_metadata()));
    assert!(!cycle.is_verified());
    assert_eq!(cycle.health().completed_steps, 0);
    match cycle.modal() {
        Some(Modal::Success { message, .. }) => {
            assert_eq!(message, "New payroll cycle started. All steps have been reset.");
        }
        other => panic!("expected success modal, got {other:?}"),
    }
    assert_eq!(store.value(keys::VERIFICATION_FLAG).as_deref(), Some("false"));
    assert_eq!(store.value(keys::CHECKED).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_cancelled_reset_keeps_progress() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;
    run_step(&cycle, "incentive-validation").await;

    cycle.request_reset();
    assert!(cycle.cancel());
    assert_eq!(
        cycle.step("incentive-validation").unwrap().status,
        StepStatus::Completed
    );
}

#[tokio::test]
async fn test_unknown_step_is_an_error() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    assert!(matches!(
        cycle.request_execute("ghost"),
        Err(CycleError::UnknownStep { .. })
    ));
    assert!(matches!(cycle.step("ghost"), Err(CycleError::UnknownStep { .. })));
    assert!(matches!(
        cycle.set_checked("ghost", true),
        Err(CycleError::UnknownStep { .. })
    ));
    assert_eq!(cycle.modal(), None);
}

#[tokio::test]
async fn test_build_requires_handler_for_every_step() {
    let handler = ScriptedHandler::new();
    let result = CycleBuilder::new()
        .with_store(MemoryStore::new())
        .with_month(MONTH)
        .with_handlers(ActionHandlers::new().with("incentive-validation", handler))
        .build()
        .await;

    match result {
        Err(CycleError::MissingHandler { id }) => {
            assert_eq!(id, "incentive-calculation");
        }
        Err(other) => panic!("expected missing handler, got {other}"),
        Ok(_) => panic!("expected missing handler"),
    }
}

#[tokio::test]
async fn test_checkbox_refusals() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    assert!(matches!(
        cycle.set_checked("arrears-deductions", true).unwrap(),
        Some(Precondition::StepLocked { .. })
    ));
    assert_eq!(
        cycle.set_checked("bank-transfer", true).unwrap(),
        Some(Precondition::NoCheckbox)
    );
    assert_eq!(cycle.toggle_checked("incentive-validation").unwrap(), None);
    assert!(cycle.step("incentive-validation").unwrap().checked);
    assert_eq!(cycle.toggle_checked("incentive-validation").unwrap(), None);
    assert!(!cycle.step("incentive-validation").unwrap().checked);

    run_step(&cycle, "incentive-validation").await;
    assert_eq!(
        cycle.set_checked("incentive-validation", false).unwrap(),
        Some(Precondition::AlreadyCompleted)
    );
    assert!(cycle.step("incentive-validation").unwrap().checked);
}

#[tokio::test]
async fn test_verify_report_posts_handoff() {
    let store = MemoryStore::new();
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(store.clone(), &handler).await;

    assert!(matches!(
        cycle.verify_report(GATED).await.unwrap(),
        VerifyOutcome::Rejected(Precondition::StepLocked { .. })
    ));
    assert_eq!(
        cycle.verify_report("bank-transfer").await.unwrap(),
        VerifyOutcome::Rejected(Precondition::NoVerificationRequired)
    );

    run_step(&cycle, "incentive-validation").await;
    let outcome = cycle.verify_report(GATED).await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::Posted(_)));
    assert!(store.value(keys::VERIFICATION_HANDOFF).is_some());
    assert!(!cycle.is_verified());

    assert_eq!(cycle.consume_handoff(), Some(VerificationOutcome::Verified));
    assert!(cycle.is_verified());
    assert!(store.value(keys::VERIFICATION_HANDOFF).is_none());
    assert_eq!(cycle.consume_handoff(), None);
}

#[tokio::test]
async fn test_handoff_consumed_at_startup() {
    let store = MemoryStore::new();
    {
        let handler = ScriptedHandler::new();
        let cycle = memory_cycle(store.clone(), &handler).await;
        run_step(&cycle, "incentive-validation").await;
    }
    let mut poster = store.clone();
    post_handoff(&mut poster, &VerificationEvent::approved(GATED, None)).unwrap();

    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(store.clone(), &handler).await;
    assert!(cycle.is_verified());
    assert_eq!(cycle.modal().map(|m| m.kind()), Some(ModalKind::Success));

    // A restart does not announce the verification again.
    let again = memory_cycle(store, &handler).await;
    assert!(again.is_verified());
    assert_eq!(again.modal(), None);
}

#[tokio::test]
async fn test_logs_report_and_info_modals() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    cycle.show_logs("lop-push").await.unwrap();
    match cycle.modal() {
        Some(Modal::Logs {
            title,
            entries,
            error,
            ..
        }) => {
            assert_eq!(title, "Process Logs - LOP (Push to GreytHR)");
            assert_eq!(entries.len(), 3);
            assert_eq!(error, None);
        }
        other => panic!("expected logs modal, got {other:?}"),
    }

    let url = cycle.view_report(GATED).await.unwrap();
    assert_eq!(url.as_deref(), Some("/reports/incentive-calculation.pdf"));
    assert_eq!(cycle.modal().map(|m| m.kind()), Some(ModalKind::Success));

    assert_eq!(cycle.view_report("bank-transfer").await.unwrap(), None);
    assert_eq!(cycle.modal().map(|m| m.kind()), Some(ModalKind::Error));

    cycle.show_info("lop-push").unwrap();
    match cycle.modal() {
        Some(Modal::Info { title, message }) => {
            assert_eq!(title, "Information");
            assert_eq!(message, "Information about LOP (Push to GreytHR)");
        }
        other => panic!("expected info modal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_logs_without_reporting_backend() {
    let handler = ScriptedHandler::new();
    let cycle = CycleBuilder::new()
        .with_store(MemoryStore::new())
        .with_month(MONTH)
        .with_handlers(common::shared_handlers(&handler))
        .build()
        .await
        .unwrap();

    cycle.show_logs("lop-push").await.unwrap();
    match cycle.modal() {
        Some(Modal::Logs { entries, error, .. }) => {
            assert!(entries.is_empty());
            assert!(error.is_some());
        }
        other => panic!("expected logs modal, got {other:?}"),
    }
}

#[tokio::test]
async fn test_month_switch_reaches_handlers() {
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(MemoryStore::new(), &handler).await;

    assert!(matches!(
        cycle.select_month("  "),
        Err(CycleError::InvalidInput { .. })
    ));
    cycle.select_month("February 2026").unwrap();
    assert_eq!(cycle.selected_month(), "February 2026");
    assert_eq!(
        cycle.steps()[0].descriptor.title,
        "Incentive Final Type Validation for February"
    );

    run_step(&cycle, "incentive-validation").await;
    assert_eq!(handler.months(), vec!["February 2026".to_string()]);
}

#[tokio::test]
async fn test_persistence_failure_is_not_fatal() {
    let store = MemoryStore::new();
    let handler = ScriptedHandler::new();
    let cycle = memory_cycle(store.clone(), &handler).await;

    store.set_fail_writes(true);
    let outcome = run_step(&cycle, "incentive-validation").await;
    assert!(matches!(
        outcome,
        ConfirmOutcome::Executed(ExecutionOutcome::Completed { .. })
    ));
    assert_eq!(
        cycle.step("incentive-validation").unwrap().status,
        StepStatus::Completed
    );
    assert!(store.value(keys::STEPS).is_none());
    assert!(cycle.save().is_err());

    store.set_fail_writes(false);
    cycle.save().unwrap();
    assert!(store
        .value(keys::STEPS)
        .is_some_and(|raw| raw.contains("completed")));
}
