#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use payrun_core::{
    handler::SimulatedPayroll, store::MemoryStore, ActionFailure, ActionHandler, ActionHandlers,
    ActionOutcome, ConfirmOutcome, CycleBuilder, Orchestrator, RequestOutcome, StepRegistry,
};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Notify;

pub const MONTH: &str = "January 2026";

/// Handler that records its calls and can be told to fail, to panic or to
/// wait on a gate before answering.
#[derive(Default)]
pub struct ScriptedHandler {
    calls: AtomicUsize,
    fail: AtomicBool,
    panic: AtomicBool,
    gate: Option<Arc<Notify>>,
    months: Mutex<Vec<String>>,
}

impl ScriptedHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call blocks until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_panicking(&self, panic: bool) {
        self.panic.store(panic, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn months(&self) -> Vec<String> {
        self.months.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionHandler for ScriptedHandler {
    async fn execute(
        &self,
        month: &str,
        _payload: Option<&Value>,
    ) -> Result<ActionOutcome, ActionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.months.lock().unwrap().push(month.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panic.load(Ordering::SeqCst) {
            panic!("handler blew up");
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActionFailure::new("backend unavailable"));
        }
        Ok(ActionOutcome::new("done").with_metadata("Processed", "10 employees"))
    }
}

/// The same handler registered for every payroll step.
pub fn shared_handlers(handler: &Arc<ScriptedHandler>) -> ActionHandlers {
    let registry = StepRegistry::payroll(MONTH);
    registry
        .ids()
        .fold(ActionHandlers::new(), |handlers, id| {
            handlers.with(id.clone(), handler.clone())
        })
}

/// Cycle over `store`, every step answered by `handler`, reporting through
/// the simulated backend.
pub async fn memory_cycle(store: MemoryStore, handler: &Arc<ScriptedHandler>) -> Orchestrator {
    CycleBuilder::new()
        .with_store(store)
        .with_month(MONTH)
        .with_handlers(shared_handlers(handler))
        .with_reporting(SimulatedPayroll::default())
        .build()
        .await
        .expect("Failed to build cycle")
}

/// Cycle persisted to a temporary SQLite database, driven by the zero
/// latency simulated backend.
pub async fn create_test_cycle() -> (TempDir, Orchestrator) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let cycle = sqlite_cycle(&temp_dir).await;
    (temp_dir, cycle)
}

pub async fn sqlite_cycle(temp_dir: &TempDir) -> Orchestrator {
    let backend = SimulatedPayroll::default();
    CycleBuilder::new()
        .with_database_path(Some(temp_dir.path().join("payrun.db")))
        .with_month(MONTH)
        .with_handlers(backend.handlers())
        .with_reporting(backend)
        .build()
        .await
        .expect("Failed to build cycle")
}

/// Ticks the checkbox when needed, requests and confirms one execution.
pub async fn run_step(cycle: &Orchestrator, id: &str) -> ConfirmOutcome {
    let needs_check = cycle
        .steps()
        .iter()
        .any(|step| step.descriptor.id.as_str() == id && step.descriptor.requires_checkbox);
    if needs_check {
        assert_eq!(cycle.set_checked(id, true).expect("Failed to tick box"), None);
    }
    assert_eq!(
        cycle.request_execute(id).expect("Failed to request execution"),
        RequestOutcome::AwaitingConfirmation
    );
    cycle.confirm().await.expect("Failed to confirm")
}
