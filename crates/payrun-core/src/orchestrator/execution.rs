//! Step execution, confirmation and the whole-cycle reset.

use std::sync::{Mutex, PoisonError};

use jiff::Timestamp;
use log::{debug, error, info};
use serde_json::json;

use super::{FlightGuard, Orchestrator, Session};
use crate::{
    display::LocalDateTime,
    error::Result,
    handler::ActionFailure,
    modal::{ConfirmAction, Modal, ModalKind},
    models::{ActionType, StepId, StepStatus, METADATA_LAST_RUN},
    precondition::Precondition,
    store::StepStateStore,
};

/// Result of asking to execute a step or reset the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The step is executing; nothing was opened
    AlreadyRunning,
    /// A precondition failed; an error modal is open
    Rejected(Precondition),
    /// A confirm modal is open
    AwaitingConfirmation,
}

/// Result of one confirmed execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed {
        message: String,
        artifact: Option<String>,
    },
    Failed(ActionFailure),
    /// A precondition stopped being true while the dialog was open
    Rejected(Precondition),
    AlreadyRunning,
}

/// Result of accepting the open confirm modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// No confirm modal was open
    NothingPending,
    Executed(ExecutionOutcome),
    Reset,
    /// The reset was refused because a step is executing
    ResetRejected(Precondition),
}

/// Fails a step that is still `running` when the execution that started it
/// unwinds or is dropped before recording a result.
pub(super) struct RunGuard<'a> {
    pub(super) session: &'a Mutex<Session>,
    pub(super) id: &'a StepId,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let Session { store, modals } = &mut *guard;
        let id = self.id.as_str();
        if !store.get(id).is_ok_and(|state| state.status == StepStatus::Running) {
            return;
        }
        error!("Execution of step '{id}' ended without a result; marking it as failed");
        if let Err(e) = store.set_status(id, StepStatus::Error) {
            error!("Failed to mark step '{id}' as failed: {e}");
        }
        modals.open(Modal::error(
            "Error",
            "An error occurred while processing the step",
        ));
    }
}

fn refusal(store: &StepStateStore, id: &str) -> Result<Option<Precondition>> {
    let descriptor = store.descriptor(id)?;
    let state = store.get(id)?;
    let enabled = store.is_enabled(id)?;
    Ok(Precondition::check(
        descriptor,
        state,
        enabled,
        store.verification(),
    ))
}

impl Orchestrator {
    /// Asks to execute step `id`.
    ///
    /// A step that is already executing is a silent no-op. Otherwise the
    /// preconditions are checked in order (completed, acknowledgement,
    /// gating, verification) and the first failure opens an error modal.
    /// When all pass, a confirm modal is opened; nothing runs until
    /// [`confirm`](Self::confirm).
    ///
    /// # Errors
    ///
    /// Returns `CycleError::UnknownStep` for ids outside the registry.
    pub fn request_execute(&self, id: &str) -> Result<RequestOutcome> {
        let mut guard = self.session();
        let Session { store, modals } = &mut *guard;

        if self.is_in_flight(id) || store.check_running(id, Timestamp::now())? {
            debug!("Step '{id}' is already running; ignoring request");
            return Ok(RequestOutcome::AlreadyRunning);
        }

        if let Some(refusal) = refusal(store, id)? {
            debug!("Refusing to execute '{id}': {refusal}");
            modals.open(Modal::from(&refusal));
            return Ok(RequestOutcome::Rejected(refusal));
        }

        let descriptor = store.descriptor(id)?;
        let title = match descriptor.action_type {
            ActionType::Run => "Confirm Run Step",
            ActionType::Submit => "Confirm Submit Step",
        };
        let message = format!(
            "Are you sure you want to {} \"{}\"?",
            descriptor.action_type.verb(),
            descriptor.title
        );
        modals.open(Modal::confirm(
            title,
            message,
            ConfirmAction::ExecuteStep(descriptor.id.clone()),
        ));
        Ok(RequestOutcome::AwaitingConfirmation)
    }

    /// Accepts the open confirm modal and performs its action.
    pub async fn confirm(&self) -> Result<ConfirmOutcome> {
        let action = {
            let mut session = self.session();
            if session.modals.kind() != Some(ModalKind::Confirm) {
                return Ok(ConfirmOutcome::NothingPending);
            }
            match session.modals.close() {
                Some(Modal::Confirm { action, .. }) => action,
                _ => return Ok(ConfirmOutcome::NothingPending),
            }
        };

        match action {
            ConfirmAction::ExecuteStep(id) => {
                let outcome = self.execute_confirmed(&id).await?;
                Ok(ConfirmOutcome::Executed(outcome))
            }
            ConfirmAction::ResetCycle => Ok(self.reset_cycle()),
        }
    }

    /// Dismisses the open confirm modal without side effects.
    ///
    /// Returns `false` when no confirmation was pending.
    pub fn cancel(&self) -> bool {
        let mut session = self.session();
        if session.modals.kind() == Some(ModalKind::Confirm) {
            session.modals.close();
            true
        } else {
            false
        }
    }

    async fn execute_confirmed(&self, id: &StepId) -> Result<ExecutionOutcome> {
        let Some(_flight) = FlightGuard::acquire(&self.in_flight, id) else {
            debug!("Step '{id}' is already running; ignoring confirmation");
            return Ok(ExecutionOutcome::AlreadyRunning);
        };
        let handler = self.handlers.get(id.as_str())?;

        let (month, payload, action_type) = {
            let mut guard = self.session();
            let Session { store, modals } = &mut *guard;

            let now = Timestamp::now();
            if store.check_running(id.as_str(), now)? {
                debug!("Step '{id}' is running in another session; ignoring confirmation");
                return Ok(ExecutionOutcome::AlreadyRunning);
            }
            if let Some(refusal) = refusal(store, id.as_str())? {
                debug!("Refusing confirmed execution of '{id}': {refusal}");
                modals.open(Modal::from(&refusal));
                return Ok(ExecutionOutcome::Rejected(refusal));
            }

            let action_type = store.descriptor(id.as_str())?.action_type;
            let payload = match action_type {
                ActionType::Submit => Some(json!({ "acknowledged": true })),
                ActionType::Run => None,
            };
            store.begin_run(id.as_str(), now)?;
            (store.selected_month().to_string(), payload, action_type)
        };
        let _run = RunGuard {
            session: &self.session,
            id,
        };

        info!("Executing step '{id}' for {month}");
        let result = handler.execute(&month, payload.as_ref()).await;

        let mut guard = self.session();
        let Session { store, modals } = &mut *guard;
        match result {
            Ok(outcome) => {
                let now = Timestamp::now();
                let mut metadata = outcome.metadata;
                metadata.insert(METADATA_LAST_RUN.to_string(), LocalDateTime(&now).to_string());
                store.complete(id.as_str(), now, metadata)?;

                let message = if outcome.message.is_empty() {
                    match action_type {
                        ActionType::Run => "Step completed successfully".to_string(),
                        ActionType::Submit => "Step submitted successfully".to_string(),
                    }
                } else {
                    outcome.message
                };
                info!("Step '{id}' completed: {message}");
                modals.open(Modal::success(
                    "Success",
                    message.clone(),
                    outcome.artifact_ref.clone(),
                ));
                Ok(ExecutionOutcome::Completed {
                    message,
                    artifact: outcome.artifact_ref,
                })
            }
            Err(failure) => {
                store.set_status(id.as_str(), StepStatus::Error)?;
                error!("Step '{id}' failed: {failure}");
                let message = if failure.message.is_empty() {
                    "An error occurred while processing the step".to_string()
                } else {
                    failure.message.clone()
                };
                modals.open(Modal::error("Error", message));
                Ok(ExecutionOutcome::Failed(failure))
            }
        }
    }

    /// Asks to start a new payroll cycle. Opens a confirm modal, or an
    /// error modal while a step is executing.
    pub fn request_reset(&self) -> RequestOutcome {
        let mut session = self.session();
        if let Some(refusal) = self.reset_refusal(&session) {
            session.modals.open(Modal::from(&refusal));
            return RequestOutcome::Rejected(refusal);
        }
        session.modals.open(Modal::confirm(
            "Start New Payroll",
            "Are you sure you want to start a new payroll cycle? This will reset all steps.",
            ConfirmAction::ResetCycle,
        ));
        RequestOutcome::AwaitingConfirmation
    }

    fn reset_cycle(&self) -> ConfirmOutcome {
        let mut session = self.session();
        if let Some(refusal) = self.reset_refusal(&session) {
            session.modals.open(Modal::from(&refusal));
            return ConfirmOutcome::ResetRejected(refusal);
        }

        session.store.reset();
        session.modals.open(Modal::success(
            "Success",
            "New payroll cycle started. All steps have been reset.",
            None,
        ));
        ConfirmOutcome::Reset
    }

    /// Checked under the session lock, so no execution can begin between the
    /// check and the reset.
    fn reset_refusal(&self, session: &Session) -> Option<Precondition> {
        if self.any_in_flight() || session.store.has_live_run(Timestamp::now()) {
            return Some(Precondition::StepInFlight);
        }
        None
    }
}
