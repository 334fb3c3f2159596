//! Step operations besides execution: checkbox, logs, report, info, and the
//! board settings.

use log::{debug, warn};

use super::{Orchestrator, Session};
use crate::{
    error::{CycleError, Result},
    gating,
    modal::Modal,
    models::{StepId, StepStatus, ViewMode},
    precondition::Precondition,
};

impl Orchestrator {
    /// Ticks or clears the acknowledgement checkbox of `id`.
    ///
    /// Refused, with an error modal, for steps without a checkbox and for
    /// steps that are locked, running or completed. Returns the refusal, if
    /// any.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::UnknownStep` for ids outside the registry.
    pub fn set_checked(&self, id: &str, checked: bool) -> Result<Option<Precondition>> {
        let mut guard = self.session();
        let Session { store, modals } = &mut *guard;
        let descriptor = store.descriptor(id)?;
        let state = store.get(id)?;
        let index = store.index_of(id)?;

        let refusal = if !descriptor.requires_checkbox {
            Some(Precondition::NoCheckbox)
        } else if state.is_completed() {
            Some(Precondition::AlreadyCompleted)
        } else if state.status == StepStatus::Running || self.is_in_flight(id) {
            Some(Precondition::StepInFlight)
        } else if !gating::is_enabled(store.states(), index) {
            Some(Precondition::StepLocked {
                action: descriptor.action_type,
            })
        } else {
            None
        };

        if let Some(refusal) = refusal {
            debug!("Refusing checkbox change on '{id}': {refusal}");
            modals.open(Modal::from(&refusal));
            return Ok(Some(refusal));
        }

        store.set_checked(id, checked)?;
        Ok(None)
    }

    /// Flips the checkbox of `id`. See [`set_checked`](Self::set_checked).
    pub fn toggle_checked(&self, id: &str) -> Result<Option<Precondition>> {
        let checked = self.session().store.get(id)?.checked;
        self.set_checked(id, !checked)
    }

    /// Fetches the process log of `id` and opens it in a logs modal. A
    /// failed fetch still opens the modal, carrying the error.
    pub async fn show_logs(&self, id: &str) -> Result<()> {
        let (step_id, title) = {
            let session = self.session();
            let descriptor = session.store.descriptor(id)?;
            (descriptor.id.clone(), descriptor.title.clone())
        };

        let fetched = self.reporting.fetch_logs(&step_id).await;
        let (entries, error) = match fetched {
            Ok(entries) => (entries, None),
            Err(failure) => {
                warn!("Failed to fetch logs for '{step_id}': {failure}");
                (Vec::new(), Some(failure.message))
            }
        };
        self.open_modal(Modal::Logs {
            step_id,
            title: format!("Process Logs - {title}"),
            entries,
            error,
        });
        Ok(())
    }

    /// Fetches the report attached to `id` and opens it in a success modal
    /// carrying the artifact reference.
    pub async fn view_report(&self, id: &str) -> Result<Option<String>> {
        let (step_id, month, label) = {
            let session = self.session();
            let descriptor = session.store.descriptor(id)?;
            (
                descriptor.id.clone(),
                session.store.selected_month().to_string(),
                descriptor.report_link.clone(),
            )
        };
        let Some(label) = label else {
            self.open_modal(Modal::from(&Precondition::NoReport));
            return Ok(None);
        };

        match self.reporting.fetch_report(&step_id, &month).await {
            Ok(link) => {
                let message = if link.message.is_empty() {
                    format!("{label} is ready")
                } else {
                    link.message
                };
                self.open_modal(Modal::success("Report Ready", message, link.url.clone()));
                Ok(link.url)
            }
            Err(failure) => {
                warn!("Failed to fetch report for '{step_id}': {failure}");
                self.open_modal(Modal::error("Error", failure.message));
                Ok(None)
            }
        }
    }

    /// Opens the informational note of `id`.
    pub fn show_info(&self, id: &str) -> Result<()> {
        let mut guard = self.session();
        let Session { store, modals } = &mut *guard;
        let descriptor = store.descriptor(id)?;
        if descriptor.has_info {
            modals.open(Modal::info(
                "Information",
                format!("Information about {}", descriptor.title),
            ));
        } else {
            modals.open(Modal::from(&Precondition::NoInfo));
        }
        Ok(())
    }

    pub fn selected_month(&self) -> String {
        self.session().store.selected_month().to_string()
    }

    /// Switches the processing month used for every handler call. Progress
    /// is kept; only a reset clears it.
    pub fn select_month(&self, month: &str) -> Result<()> {
        let month = month.trim();
        if month.is_empty() {
            return Err(CycleError::invalid_input("month").with_reason("month must not be empty"));
        }
        self.session().store.select_month(month);
        Ok(())
    }

    pub fn view_mode(&self) -> ViewMode {
        self.session().store.view_mode()
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.session().store.set_view_mode(mode);
    }

    /// Id of the step gated on external verification, if any.
    pub fn verification_step(&self) -> Option<StepId> {
        self.session().store.verification().step_id().cloned()
    }

    /// Whether the verification flag is currently set.
    pub fn is_verified(&self) -> bool {
        self.session().store.verification().is_verified()
    }
}
