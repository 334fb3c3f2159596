//! Reasons an execution request is refused before anything runs.

use std::fmt;

use crate::{
    modal::Modal,
    models::{ActionType, StepDescriptor, StepState},
    verification::VerificationGate,
};

/// A refused request. Never a [`CycleError`](crate::error::CycleError): these
/// are ordinary operator mistakes reported through an error modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The step already completed in this cycle
    AlreadyCompleted,
    /// A submit step whose checkbox is not ticked
    AcknowledgementRequired,
    /// Some earlier step is not completed
    StepLocked { action: ActionType },
    /// The gated step is waiting for its report to be verified
    VerificationPending { report: String },
    /// Another operation on the cycle is in flight
    StepInFlight,
    /// The step has no acknowledgement checkbox
    NoCheckbox,
    /// The step does not wait on an external verification
    NoVerificationRequired,
    /// The step has no report attached
    NoReport,
    /// The step has no informational note
    NoInfo,
}

impl Precondition {
    /// Evaluates the checks for executing `descriptor`, first failure wins.
    ///
    /// Order: completed, acknowledgement, gating, verification.
    pub fn check(
        descriptor: &StepDescriptor,
        state: &StepState,
        enabled: bool,
        gate: &VerificationGate,
    ) -> Option<Self> {
        if state.is_completed() {
            return Some(Precondition::AlreadyCompleted);
        }
        if descriptor.action_type == ActionType::Submit && !state.checked {
            return Some(Precondition::AcknowledgementRequired);
        }
        if !enabled {
            return Some(Precondition::StepLocked {
                action: descriptor.action_type,
            });
        }
        if !gate.permits(descriptor) {
            let report = descriptor
                .report_link
                .clone()
                .unwrap_or_else(|| "report".to_string());
            return Some(Precondition::VerificationPending { report });
        }
        None
    }

    pub fn title(&self) -> &'static str {
        match self {
            Precondition::AlreadyCompleted => "Step Completed",
            Precondition::AcknowledgementRequired => "Validation Required",
            Precondition::StepLocked { .. } => "Step Not Available",
            Precondition::VerificationPending { .. } => "Report Not Verified",
            Precondition::StepInFlight => "Operation In Progress",
            Precondition::NoCheckbox => "Checkbox Not Available",
            Precondition::NoVerificationRequired => "Verification Not Required",
            Precondition::NoReport => "Report Not Available",
            Precondition::NoInfo => "Information Not Available",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Precondition::AlreadyCompleted => {
                "This step has already been completed for the current cycle.".to_string()
            }
            Precondition::AcknowledgementRequired => {
                "Please check the checkbox to confirm before submitting.".to_string()
            }
            Precondition::StepLocked { action } => format!(
                "Please complete all previous steps before {} this step.",
                action.gerund()
            ),
            Precondition::VerificationPending { report } => {
                format!("Please verify the {report} before running this step.")
            }
            Precondition::StepInFlight => {
                "Please wait for the running step to finish.".to_string()
            }
            Precondition::NoCheckbox => "This step has no confirmation checkbox.".to_string(),
            Precondition::NoVerificationRequired => {
                "This step does not need a report verification.".to_string()
            }
            Precondition::NoReport => "This step has no report to view.".to_string(),
            Precondition::NoInfo => {
                "There is no additional information for this step.".to_string()
            }
        }
    }
}

impl From<&Precondition> for Modal {
    fn from(refusal: &Precondition) -> Self {
        Modal::error(refusal.title(), refusal.message())
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}
