//! Mutable per-step state.

use std::collections::BTreeMap;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use super::{StepId, StepStatus};

/// Free-form display values attached to a step (processed count, errors,
/// last run text). Never consulted by gating.
pub type Metadata = BTreeMap<String, String>;

pub const METADATA_PROCESSED: &str = "Processed";
pub const METADATA_ERRORS: &str = "Errors";
pub const METADATA_LAST_RUN: &str = "Last Run";

/// Age after which a persisted `running` status no longer belongs to a live
/// execution. Longer than the payroll API request timeout.
pub const STALE_RUN_AFTER: SignedDuration = SignedDuration::from_secs(120);

/// Metadata every step starts a cycle with.
pub fn initial_metadata() -> Metadata {
    Metadata::from([
        (METADATA_PROCESSED.to_string(), "0 employees".to_string()),
        (METADATA_ERRORS.to_string(), "0".to_string()),
        (METADATA_LAST_RUN.to_string(), "Not started".to_string()),
    ])
}

/// Lifecycle state of one step, joined 1:1 with its descriptor by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepState {
    /// Descriptor id this state belongs to
    pub id: StepId,

    /// Current status of the step
    #[serde(default)]
    pub status: StepStatus,

    /// Operator acknowledgement, persisted separately from the step list
    #[serde(skip)]
    pub checked: bool,

    /// Set when the step transitions to completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<Timestamp>,

    /// Set when the step enters `running`, cleared when it leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl StepState {
    /// Initial state for a descriptor: pending, unchecked, template metadata.
    pub fn initial(id: StepId) -> Self {
        Self {
            id,
            status: StepStatus::Pending,
            checked: false,
            last_run_at: None,
            started_at: None,
            metadata: initial_metadata(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    /// Whether the step is `running` under an execution started less than
    /// [`STALE_RUN_AFTER`] before `now`. Such a run may belong to another
    /// session sharing the same store.
    pub fn is_live_run(&self, now: Timestamp) -> bool {
        self.status == StepStatus::Running
            && self
                .started_at
                .is_some_and(|started| now.duration_since(started) < STALE_RUN_AFTER)
    }
}
