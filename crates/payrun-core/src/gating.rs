//! Linear gating: which step may currently be invoked.
//!
//! A step at position `i` is enabled iff every step at `0..i` is
//! `completed`. The first step is always enabled. Results are never cached;
//! callers pass the current state slice every time.

use crate::models::{StepState, StepStatus};

/// Whether the step at `index` is runnable given the ordered `states`.
///
/// `states` must be in registry order. An index past the end is never
/// enabled.
///
/// # Examples
///
/// ```rust
/// use payrun_core::{gating::is_enabled, models::{StepId, StepState, StepStatus}};
///
/// let mut states: Vec<StepState> = ["a", "b", "c"]
///     .into_iter()
///     .map(|id| StepState::initial(StepId::from(id)))
///     .collect();
/// states[0].status = StepStatus::Completed;
/// states[1].status = StepStatus::Error;
///
/// assert!(is_enabled(&states, 0));
/// assert!(is_enabled(&states, 1));
/// assert!(!is_enabled(&states, 2));
/// ```
pub fn is_enabled(states: &[StepState], index: usize) -> bool {
    match states.get(..index) {
        Some(prior) if index < states.len() => prior
            .iter()
            .all(|state| matches!(state.status, StepStatus::Completed)),
        _ => false,
    }
}

/// Gating result for every step, in order.
pub fn enabled_flags(states: &[StepState]) -> Vec<bool> {
    (0..states.len()).map(|i| is_enabled(states, i)).collect()
}

/// Position of the first step that is not completed, if any.
pub fn frontier(states: &[StepState]) -> Option<usize> {
    states
        .iter()
        .position(|state| state.status != StepStatus::Completed)
}

/// Whether `states` has the shape linear gating can produce: a completed
/// prefix, at most one running or failed step, then only pending steps.
pub fn is_linear(states: &[StepState]) -> bool {
    let Some(start) = frontier(states) else {
        return true;
    };
    let rest = &states[start..];
    let tail = match rest.first().map(|s| s.status) {
        Some(StepStatus::Running | StepStatus::Error) => &rest[1..],
        _ => rest,
    };
    tail.iter().all(|state| state.status == StepStatus::Pending)
}
