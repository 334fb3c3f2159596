//! Report verification hand-off.

use log::{debug, error, info, warn};

use super::{Orchestrator, Session};
use crate::{
    error::Result,
    handler::{ActionFailure, ReportLink},
    modal::Modal,
    precondition::Precondition,
    verification::{post_handoff, take_handoff, VerificationEvent, VerificationOutcome},
};

/// Result of running the verification flow for a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The flow is not available for the step; an error modal is open
    Rejected(Precondition),
    /// The report could not be fetched; an error modal is open
    Failed(ActionFailure),
    /// The report was reviewed and an approving hand-off was posted
    Posted(ReportLink),
}

impl Orchestrator {
    /// Applies an inbound verification event.
    ///
    /// Only an approving event naming the gated step sets the flag, and only
    /// the first one opens the "Report Verified" notification; re-delivery
    /// is reported as `AlreadyVerified` and does nothing.
    pub fn receive_verification(&self, event: &VerificationEvent) -> VerificationOutcome {
        let mut session = self.session();
        apply_verification(&mut session, event)
    }

    /// Takes the pending hand-off out of the store and applies it.
    ///
    /// Returns `None` when nothing was pending. The hand-off is removed
    /// before it is applied, so a second call never sees it.
    pub fn consume_handoff(&self) -> Option<VerificationOutcome> {
        let mut session = self.session();
        let event = take_handoff(session.store.backend_mut())?;
        Some(apply_verification(&mut session, &event))
    }

    /// Runs the verification flow for `id`: fetches its report and posts an
    /// approving hand-off for [`consume_handoff`](Self::consume_handoff).
    ///
    /// Available only for the gated step, while it is enabled and not yet
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::UnknownStep` for ids outside the registry.
    pub async fn verify_report(&self, id: &str) -> Result<VerifyOutcome> {
        let (step_id, month, report) = {
            let mut guard = self.session();
            let Session { store, modals } = &mut *guard;
            let descriptor = store.descriptor(id)?;

            let refusal = if !descriptor.requires_external_verification {
                Some(Precondition::NoVerificationRequired)
            } else if store.get(id)?.is_completed() {
                Some(Precondition::AlreadyCompleted)
            } else if !store.is_enabled(id)? {
                Some(Precondition::StepLocked {
                    action: descriptor.action_type,
                })
            } else {
                None
            };
            if let Some(refusal) = refusal {
                modals.open(Modal::from(&refusal));
                return Ok(VerifyOutcome::Rejected(refusal));
            }

            (
                descriptor.id.clone(),
                store.selected_month().to_string(),
                report_label(descriptor.report_link.as_deref()),
            )
        };

        let link = match self.reporting.fetch_report(&step_id, &month).await {
            Ok(link) => link,
            Err(failure) => {
                warn!("Failed to fetch report for '{step_id}': {failure}");
                self.open_modal(Modal::error("Error", failure.message.clone()));
                return Ok(VerifyOutcome::Failed(failure));
            }
        };

        let event = VerificationEvent::approved(
            step_id,
            Some(format!("{report} has been verified. You can now run this step.")),
        );
        let mut session = self.session();
        if let Err(e) = post_handoff(session.store.backend_mut(), &event) {
            error!("Failed to post verification hand-off, applying it directly: {e}");
            apply_verification(&mut session, &event);
        }
        Ok(VerifyOutcome::Posted(link))
    }
}

fn report_label(link: Option<&str>) -> String {
    link.unwrap_or("Report").to_string()
}

fn apply_verification(session: &mut Session, event: &VerificationEvent) -> VerificationOutcome {
    let Session { store, modals } = session;
    let completed = store
        .get(event.step_id.as_str())
        .map(|state| state.is_completed())
        .unwrap_or(false);
    let outcome = store.update_verification(|gate| gate.accept(event, completed));

    match &outcome {
        VerificationOutcome::Verified => {
            info!("Step '{}' verified", event.step_id);
            let message = event.message.clone().unwrap_or_else(|| {
                let report = store
                    .descriptor(event.step_id.as_str())
                    .ok()
                    .and_then(|d| d.report_link.as_deref());
                format!(
                    "{} has been verified. You can now run this step.",
                    report_label(report)
                )
            });
            modals.open(Modal::success("Report Verified", message, None));
        }
        VerificationOutcome::AlreadyVerified => {
            debug!("Step '{}' is already verified; ignoring event", event.step_id);
        }
        VerificationOutcome::NotNeeded => {
            debug!("Step '{}' is completed; verification not needed", event.step_id);
        }
        VerificationOutcome::Declined => {
            info!("Verification of step '{}' was declined", event.step_id);
        }
        VerificationOutcome::Mismatched { expected } => {
            warn!(
                "Ignoring verification event for '{}' (gated step: {})",
                event.step_id,
                expected.as_ref().map_or("none", |id| id.as_str())
            );
        }
    }
    outcome
}
