//! Execution orchestrator: the per-step state machine of a payroll cycle.
//!
//! The [`Orchestrator`] is the only writer of the step state store. Every
//! operator action goes through it:
//!
//! ```text
//! request_execute ──▶ preconditions ──▶ confirm modal
//!                                           │
//!              cancel ◀─────────────────────┤
//!                                           ▼
//!                      confirm ──▶ running ──▶ handler.execute(month)
//!                                                │
//!                               completed ◀──────┴──────▶ error
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: [`CycleBuilder`], wiring store, registry and handlers
//! - [`execution`]: execute/confirm/cancel and the whole-cycle reset
//! - [`step_ops`]: checkbox, logs, report, info, month and view mode
//! - [`verify_ops`]: the external report verification hand-off
//!
//! # Usage
//!
//! ```rust
//! use payrun_core::{
//!     handler::SimulatedPayroll, store::MemoryStore, CycleBuilder, RequestOutcome,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SimulatedPayroll::default();
//! let cycle = CycleBuilder::new()
//!     .with_store(MemoryStore::new())
//!     .with_month("January 2026")
//!     .with_handlers(backend.handlers())
//!     .with_reporting(backend)
//!     .build()
//!     .await?;
//!
//! cycle.set_checked("incentive-validation", true)?;
//! let outcome = cycle.request_execute("incentive-validation")?;
//! assert_eq!(outcome, RequestOutcome::AwaitingConfirmation);
//! cycle.confirm().await?;
//! # Ok(())
//! # }
//! ```

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

pub mod builder;
pub mod execution;
pub mod step_ops;
pub mod verify_ops;


pub use builder::CycleBuilder;
pub use execution::{ConfirmOutcome, ExecutionOutcome, RequestOutcome};
pub use verify_ops::VerifyOutcome;

use crate::{
    display::{StepBoard, StepView},
    error::Result,
    gating,
    handler::{ActionHandlers, Reporting},
    modal::{Modal, ModalController},
    models::{CycleHealth, StepId, StepState},
    store::StepStateStore,
};

/// Everything the orchestrator mutates, guarded by one lock.
pub(crate) struct Session {
    pub(crate) store: StepStateStore,
    pub(crate) modals: ModalController,
}

/// Coordinates step execution, gating, verification and feedback for one
/// payroll cycle.
///
/// All methods take `&self`. The session lock is never held across an
/// `.await`, so the orchestrator can be shared between tasks.
pub struct Orchestrator {
    session: Mutex<Session>,
    in_flight: Mutex<HashSet<StepId>>,
    handlers: ActionHandlers,
    reporting: Arc<dyn Reporting>,
}

/// Marks a step as executing for as long as it lives.
///
/// Dropping the guard releases the step on every path out of an execution,
/// including early returns and panics inside the handler call.
pub(crate) struct FlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<StepId>>,
    id: StepId,
}

impl<'a> FlightGuard<'a> {
    /// Claims `id`, or returns `None` when it is already executing.
    pub(crate) fn acquire(in_flight: &'a Mutex<HashSet<StepId>>, id: &StepId) -> Option<Self> {
        let mut set = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(id.clone()) {
            return None;
        }
        Some(Self {
            in_flight,
            id: id.clone(),
        })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl Orchestrator {
    pub(crate) fn new(
        store: StepStateStore,
        handlers: ActionHandlers,
        reporting: Arc<dyn Reporting>,
    ) -> Self {
        Self {
            session: Mutex::new(Session {
                store,
                modals: ModalController::new(),
            }),
            in_flight: Mutex::new(HashSet::new()),
            handlers,
            reporting,
        }
    }

    pub(crate) fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub(crate) fn any_in_flight(&self) -> bool {
        !self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Current state of one step.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::UnknownStep` for ids outside the registry.
    pub fn step(&self, id: &str) -> Result<StepState> {
        self.session().store.get(id).cloned()
    }

    /// Current states of every step, in cycle order.
    pub fn states(&self) -> Vec<StepState> {
        self.session().store.states().to_vec()
    }

    /// Whether `id` may be invoked right now.
    pub fn is_enabled(&self, id: &str) -> Result<bool> {
        self.session().store.is_enabled(id)
    }

    /// Every step joined with its descriptor and current gating result.
    pub fn steps(&self) -> Vec<StepView> {
        let session = self.session();
        let store = &session.store;
        let enabled = gating::enabled_flags(store.states());
        let verified = store.verification().is_verified();

        store
            .registry()
            .descriptors()
            .iter()
            .zip(store.states())
            .zip(enabled)
            .map(|((descriptor, state), enabled)| StepView {
                descriptor: descriptor.clone(),
                state: state.clone(),
                enabled,
                in_flight: self.is_in_flight(descriptor.id.as_str()),
                awaiting_verification: descriptor.requires_external_verification
                    && !verified
                    && !state.is_completed(),
            })
            .collect()
    }

    /// The full board: month, view mode, health and every step.
    pub fn board(&self) -> StepBoard {
        let steps = self.steps();
        let session = self.session();
        StepBoard {
            month: session.store.selected_month().to_string(),
            view_mode: session.store.view_mode(),
            health: CycleHealth::from_states(session.store.states()),
            steps,
        }
    }

    pub fn health(&self) -> CycleHealth {
        CycleHealth::from_states(self.session().store.states())
    }

    /// The dialog currently open, if any.
    pub fn modal(&self) -> Option<Modal> {
        self.session().modals.current().cloned()
    }

    /// Closes the open dialog, dropping any pending confirmation.
    pub fn close_modal(&self) -> Option<Modal> {
        self.session().modals.close()
    }

    /// Persists the current snapshot, reporting failures to the caller.
    pub fn save(&self) -> Result<()> {
        self.session().store.save()
    }

    pub(crate) fn open_modal(&self, modal: Modal) {
        self.session().modals.open(modal);
    }
}
