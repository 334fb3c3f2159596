//! Single-slot feedback dialog state.
//!
//! At most one [`Modal`] is active. Opening replaces whatever is showing and
//! closing drops the whole payload, including a pending [`ConfirmAction`].

use crate::models::{LogEntry, StepId};

/// Deferred action carried by a confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Execute the step once the operator accepts
    ExecuteStep(StepId),
    /// Reset every step of the cycle
    ResetCycle,
}

/// Variant tag of a [`Modal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Confirm,
    Success,
    Error,
    Info,
    Logs,
}

/// Dialog payload, one shape per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Confirm {
        title: String,
        message: String,
        action: ConfirmAction,
    },
    Success {
        title: String,
        message: String,
        /// Downloadable artifact produced by the step, if any
        artifact: Option<String>,
    },
    Error {
        title: String,
        message: String,
    },
    Info {
        title: String,
        message: String,
    },
    Logs {
        step_id: StepId,
        title: String,
        entries: Vec<LogEntry>,
        /// Set when the entries could not be fetched
        error: Option<String>,
    },
}

impl Modal {
    pub fn confirm(title: impl Into<String>, message: impl Into<String>, action: ConfirmAction) -> Self {
        Modal::Confirm {
            title: title.into(),
            message: message.into(),
            action,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>, artifact: Option<String>) -> Self {
        Modal::Success {
            title: title.into(),
            message: message.into(),
            artifact,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Modal::Error {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Modal::Info {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ModalKind {
        match self {
            Modal::Confirm { .. } => ModalKind::Confirm,
            Modal::Success { .. } => ModalKind::Success,
            Modal::Error { .. } => ModalKind::Error,
            Modal::Info { .. } => ModalKind::Info,
            Modal::Logs { .. } => ModalKind::Logs,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Modal::Confirm { title, .. }
            | Modal::Success { title, .. }
            | Modal::Error { title, .. }
            | Modal::Info { title, .. }
            | Modal::Logs { title, .. } => title,
        }
    }
}

/// Holds the currently open dialog.
#[derive(Debug, Default)]
pub struct ModalController {
    active: Option<Modal>,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `modal`, discarding any dialog already open.
    pub fn open(&mut self, modal: Modal) {
        self.active = Some(modal);
    }

    /// Closes the active dialog and hands its payload back.
    pub fn close(&mut self) -> Option<Modal> {
        self.active.take()
    }

    pub fn current(&self) -> Option<&Modal> {
        self.active.as_ref()
    }

    pub fn kind(&self) -> Option<ModalKind> {
        self.active.as_ref().map(Modal::kind)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }
}
