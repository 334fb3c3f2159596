//! Persisted aggregate of cycle progress.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{StepId, StepState, ViewMode};

/// Everything needed to restore the board after a restart.
///
/// `steps` is kept in registry order; `checked` holds the ids whose
/// acknowledgement box is ticked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleSnapshot {
    pub steps: Vec<StepState>,
    pub checked: BTreeSet<StepId>,
    pub selected_month: String,
    pub view_mode: ViewMode,
    pub verification_flag: bool,
}
