//! Cycle health summary types.

use serde::{Deserialize, Serialize};

use super::{StepState, StepStatus};

/// Coarse health of the whole cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Error => "error",
        }
    }
}

/// Summary information about cycle progress with step statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleHealth {
    /// Total number of steps
    pub total_steps: u32,
    /// Number of completed steps
    pub completed_steps: u32,
    /// Number of steps whose last execution failed
    pub error_steps: u32,
    /// Completion rounded to one decimal place
    pub completion_percentage: f64,
    /// Overall status derived from the completion percentage
    pub overall: HealthStatus,
}

impl CycleHealth {
    /// Compute the summary from the ordered step states.
    pub fn from_states(states: &[StepState]) -> Self {
        let total_steps = states.len() as u32;
        let completed_steps = states
            .iter()
            .filter(|state| state.status == StepStatus::Completed)
            .count() as u32;
        let error_steps = states
            .iter()
            .filter(|state| state.status == StepStatus::Error)
            .count() as u32;

        let raw = if total_steps == 0 {
            0.0
        } else {
            f64::from(completed_steps) / f64::from(total_steps) * 100.0
        };
        let overall = if total_steps > 0 && completed_steps == total_steps {
            HealthStatus::Healthy
        } else if raw > 50.0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Error
        };

        Self {
            total_steps,
            completed_steps,
            error_steps,
            completion_percentage: (raw * 10.0).round() / 10.0,
            overall,
        }
    }
}
