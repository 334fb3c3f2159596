//! Verification gate for the one step that waits on an external review.
//!
//! The review happens outside the step board (the report verification
//! flow). When the reviewer approves, the flow posts a [`VerificationEvent`]
//! into the store; the orchestrator takes it out exactly once and feeds it
//! to [`VerificationGate::accept`]. The gate is a narrower precondition on
//! top of linear gating, never a replacement for it.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{StepDescriptor, StepId},
    registry::StepRegistry,
    store::{keys, KeyValueStore},
};

/// Hand-off delivered when the operator returns from the verification flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEvent {
    /// Correlation id; must name the gated step
    pub step_id: StepId,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationEvent {
    pub fn approved(step_id: impl Into<StepId>, message: Option<String>) -> Self {
        Self {
            step_id: step_id.into(),
            verified: true,
            message,
        }
    }
}

/// What accepting an event did to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The flag was set by this event
    Verified,
    /// The flag was already set; nothing to announce
    AlreadyVerified,
    /// The gated step is completed; verification no longer matters
    NotNeeded,
    /// The event did not approve the step
    Declined,
    /// The event names a step that is not the gated one
    Mismatched { expected: Option<StepId> },
}

/// Verification flag for the gated step of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationGate {
    step_id: Option<StepId>,
    verified: bool,
}

impl VerificationGate {
    pub fn new(registry: &StepRegistry, verified: bool) -> Self {
        Self {
            step_id: registry.verification_step().map(|d| d.id.clone()),
            verified,
        }
    }

    /// Id of the gated step, if the registry has one.
    pub fn step_id(&self) -> Option<&StepId> {
        self.step_id.as_ref()
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Whether this gate lets `descriptor` execute.
    pub fn permits(&self, descriptor: &StepDescriptor) -> bool {
        !descriptor.requires_external_verification || self.verified
    }

    /// Applies an inbound event. Only an approving event for the gated step
    /// changes anything, and only the first one reports `Verified`.
    pub fn accept(&mut self, event: &VerificationEvent, step_completed: bool) -> VerificationOutcome {
        if self.step_id.as_ref() != Some(&event.step_id) {
            return VerificationOutcome::Mismatched {
                expected: self.step_id.clone(),
            };
        }
        if !event.verified {
            return VerificationOutcome::Declined;
        }
        if step_completed {
            return VerificationOutcome::NotNeeded;
        }
        if self.verified {
            return VerificationOutcome::AlreadyVerified;
        }
        self.verified = true;
        VerificationOutcome::Verified
    }

    pub fn clear(&mut self) {
        self.verified = false;
    }
}

/// Posts a hand-off for the orchestrator to pick up, replacing any earlier
/// one that was never consumed.
pub fn post_handoff(store: &mut dyn KeyValueStore, event: &VerificationEvent) -> Result<()> {
    let payload = serde_json::to_string(event)?;
    store.set(keys::VERIFICATION_HANDOFF, &payload)?;
    info!("Posted verification hand-off for step '{}'", event.step_id);
    Ok(())
}

/// Takes the pending hand-off out of the store.
///
/// The key is removed before the event is returned, so a second call sees
/// nothing. Malformed payloads are dropped with a warning.
pub fn take_handoff(store: &mut dyn KeyValueStore) -> Option<VerificationEvent> {
    let raw = match store.get(keys::VERIFICATION_HANDOFF) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read verification hand-off: {e}");
            return None;
        }
    };

    if let Err(e) = store.remove(keys::VERIFICATION_HANDOFF) {
        warn!("Failed to clear verification hand-off: {e}");
    }

    match serde_json::from_str(&raw) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Dropping malformed verification hand-off: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn gate() -> VerificationGate {
        VerificationGate::new(&StepRegistry::payroll("January 2026"), false)
    }

    #[test]
    fn test_gate_targets_incentive_calculation() {
        assert_eq!(gate().step_id().map(StepId::as_str), Some("incentive-calculation"));
    }

    #[test]
    fn test_accept_sets_flag_once() {
        let mut gate = gate();
        let event = VerificationEvent::approved("incentive-calculation", None);
        assert_eq!(gate.accept(&event, false), VerificationOutcome::Verified);
        assert!(gate.is_verified());
        assert_eq!(gate.accept(&event, false), VerificationOutcome::AlreadyVerified);
    }

    #[test]
    fn test_accept_ignores_other_steps_and_declines() {
        let mut gate = gate();
        let wrong = VerificationEvent::approved("bank-transfer", None);
        assert!(matches!(
            gate.accept(&wrong, false),
            VerificationOutcome::Mismatched { .. }
        ));

        let declined = VerificationEvent {
            step_id: StepId::from("incentive-calculation"),
            verified: false,
            message: None,
        };
        assert_eq!(gate.accept(&declined, false), VerificationOutcome::Declined);
        assert!(!gate.is_verified());
    }

    #[test]
    fn test_permits_only_gates_flagged_step() {
        let registry = StepRegistry::payroll("January 2026");
        let gate = VerificationGate::new(&registry, false);
        assert!(gate.permits(&registry.descriptors()[0]));
        assert!(!gate.permits(&registry.descriptors()[1]));
    }

    #[test]
    fn test_handoff_is_taken_once() {
        let mut store = MemoryStore::new();
        let event = VerificationEvent::approved(
            "incentive-calculation",
            Some("Report verified".to_string()),
        );
        post_handoff(&mut store, &event).unwrap();

        let raw = store.value(keys::VERIFICATION_HANDOFF).unwrap();
        assert!(raw.contains("\"stepId\":\"incentive-calculation\""));

        assert_eq!(take_handoff(&mut store), Some(event));
        assert_eq!(take_handoff(&mut store), None);
    }

    #[test]
    fn test_malformed_handoff_is_dropped() {
        let mut store = MemoryStore::new();
        store.insert(keys::VERIFICATION_HANDOFF, "{\"verified\": true}");
        assert_eq!(take_handoff(&mut store), None);
        assert_eq!(store.value(keys::VERIFICATION_HANDOFF), None);
    }
}
