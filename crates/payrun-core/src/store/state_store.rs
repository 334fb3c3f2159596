//! Mutable per-step state with write-through persistence.

use jiff::Timestamp;
use log::{debug, error, info, warn};

use super::{read_snapshot, write_snapshot, KeyValueStore};
use crate::{
    error::{CycleError, Result},
    gating,
    models::{
        initial_metadata, CycleSnapshot, Metadata, StepDescriptor, StepState, StepStatus, ViewMode,
        STALE_RUN_AFTER,
    },
    registry::StepRegistry,
    verification::VerificationGate,
};

/// Owns the registry, the ordered step states and the session settings of
/// one payroll cycle.
///
/// Every mutator persists the whole snapshot afterwards. A failed write is
/// logged and otherwise ignored: the in-memory state stays authoritative for
/// the running session.
pub struct StepStateStore {
    registry: StepRegistry,
    states: Vec<StepState>,
    selected_month: String,
    view_mode: ViewMode,
    verification: VerificationGate,
    backend: Box<dyn KeyValueStore>,
}

impl StepStateStore {
    /// Restores the store from `backend`, degrading unreadable fields to the
    /// registry defaults. Never fails.
    pub fn load(registry: StepRegistry, backend: Box<dyn KeyValueStore>, default_month: &str) -> Self {
        let snapshot = read_snapshot(backend.as_ref(), &registry, default_month);
        let registry = if registry
            .descriptors()
            .iter()
            .all(|d| d.month == snapshot.selected_month)
        {
            registry
        } else {
            registry.for_month(&snapshot.selected_month)
        };
        let verification = VerificationGate::new(&registry, snapshot.verification_flag);
        debug!(
            "Loaded cycle for {} ({} steps, verification flag {})",
            snapshot.selected_month,
            snapshot.steps.len(),
            snapshot.verification_flag
        );

        Self {
            registry,
            states: snapshot.steps,
            selected_month: snapshot.selected_month,
            view_mode: snapshot.view_mode,
            verification,
            backend,
        }
    }

    /// Re-reads the snapshot from the backend, replacing in-memory state.
    pub fn reload(&mut self) {
        let snapshot = read_snapshot(self.backend.as_ref(), &self.registry, &self.selected_month);
        self.apply(snapshot);
    }

    /// Persists the full snapshot, reporting failures to the caller.
    pub fn save(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        write_snapshot(self.backend.as_mut(), &snapshot)
    }

    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            steps: self.states.clone(),
            checked: self
                .states
                .iter()
                .filter(|s| s.checked)
                .map(|s| s.id.clone())
                .collect(),
            selected_month: self.selected_month.clone(),
            view_mode: self.view_mode,
            verification_flag: self.verification.is_verified(),
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Step states in registry order.
    pub fn states(&self) -> &[StepState] {
        &self.states
    }

    pub fn index_of(&self, id: &str) -> Result<usize> {
        self.registry
            .index_of(id)
            .ok_or_else(|| CycleError::unknown_step(id))
    }

    pub fn get(&self, id: &str) -> Result<&StepState> {
        let index = self.index_of(id)?;
        Ok(&self.states[index])
    }

    pub fn descriptor(&self, id: &str) -> Result<&StepDescriptor> {
        let index = self.index_of(id)?;
        Ok(&self.registry.descriptors()[index])
    }

    /// Linear gating for `id` against the current states.
    pub fn is_enabled(&self, id: &str) -> Result<bool> {
        let index = self.index_of(id)?;
        Ok(gating::is_enabled(&self.states, index))
    }

    pub fn set_status(&mut self, id: &str, status: StepStatus) -> Result<()> {
        self.mutate(id, |state| {
            state.status = status;
            if status != StepStatus::Running {
                state.started_at = None;
            }
        })
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) -> Result<()> {
        self.mutate(id, |state| state.checked = checked)
    }

    pub fn merge_metadata(&mut self, id: &str, patch: Metadata) -> Result<()> {
        self.mutate(id, |state| state.metadata.extend(patch))
    }

    /// Enters `running` at `at`, dropping metadata left over from a failed
    /// attempt.
    pub fn begin_run(&mut self, id: &str, at: Timestamp) -> Result<()> {
        self.mutate(id, |state| {
            state.status = StepStatus::Running;
            state.started_at = Some(at);
            state.metadata = initial_metadata();
        })
    }

    /// Whether `id` belongs to a live execution as of `now`.
    ///
    /// A `running` status older than [`STALE_RUN_AFTER`] was abandoned; it is
    /// marked `error` here so the step can be invoked again.
    pub fn check_running(&mut self, id: &str, now: Timestamp) -> Result<bool> {
        let state = self.get(id)?;
        if state.is_live_run(now) {
            return Ok(true);
        }
        if state.status == StepStatus::Running {
            warn!("Step '{id}' was left running by an abandoned execution; marking it as failed");
            self.set_status(id, StepStatus::Error)?;
        }
        Ok(false)
    }

    /// Whether any step belongs to a live execution as of `now`.
    pub fn has_live_run(&self, now: Timestamp) -> bool {
        self.states.iter().any(|state| state.is_live_run(now))
    }

    /// Marks the step completed at `at` and merges the handler's metadata.
    pub fn complete(&mut self, id: &str, at: Timestamp, patch: Metadata) -> Result<()> {
        self.mutate(id, |state| {
            state.status = StepStatus::Completed;
            state.last_run_at = Some(at);
            state.started_at = None;
            state.metadata.extend(patch);
        })
    }

    pub fn selected_month(&self) -> &str {
        &self.selected_month
    }

    /// Switches the processing month. Progress is kept.
    pub fn select_month(&mut self, month: &str) {
        self.registry = self.registry.for_month(month);
        self.selected_month = month.to_string();
        self.persist();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.persist();
    }

    pub fn verification(&self) -> &VerificationGate {
        &self.verification
    }

    /// Runs `f` against the verification gate and persists the flag.
    pub fn update_verification<T>(&mut self, f: impl FnOnce(&mut VerificationGate) -> T) -> T {
        let result = f(&mut self.verification);
        self.persist();
        result
    }

    /// Back to the registry's initial state: every step pending and
    /// unchecked, verification flag cleared.
    pub fn reset(&mut self) {
        self.states = self.registry.initial_states();
        self.verification.clear();
        info!("Payroll cycle for {} reset", self.selected_month);
        self.persist();
    }

    /// Direct access to the backing store for side channels such as the
    /// verification hand-off.
    pub fn backend_mut(&mut self) -> &mut dyn KeyValueStore {
        self.backend.as_mut()
    }

    fn mutate(&mut self, id: &str, f: impl FnOnce(&mut StepState)) -> Result<()> {
        let index = self.index_of(id)?;
        f(&mut self.states[index]);
        debug!("Step '{id}' is now {}", self.states[index].status.as_str());
        self.persist();
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            error!("Failed to persist cycle snapshot: {e}");
        }
    }

    fn apply(&mut self, snapshot: CycleSnapshot) {
        if snapshot.selected_month != self.selected_month {
            self.registry = self.registry.for_month(&snapshot.selected_month);
        }
        self.verification = VerificationGate::new(&self.registry, snapshot.verification_flag);
        self.states = snapshot.steps;
        self.selected_month = snapshot.selected_month;
        self.view_mode = snapshot.view_mode;
    }
}
