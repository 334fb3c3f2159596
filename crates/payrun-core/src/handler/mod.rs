//! Collaborators that perform the real work behind each step.
//!
//! An [`ActionHandler`] is a one-shot asynchronous call made once per
//! confirmed execution. There are no retries at this layer; a failure is
//! reported back and the operator decides whether to run the step again.
//!
//! Two implementations ship with the crate:
//!
//! - [`PayrollApi`]: the payroll backend over HTTP
//! - [`SimulatedPayroll`]: canned responses with configurable latency, for
//!   development and demos

pub mod http;
pub mod simulated;

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::PayrollApi;
pub use simulated::SimulatedPayroll;

use crate::{
    error::{CycleError, Result},
    models::{LogEntry, Metadata, StepId},
    registry::StepRegistry,
};

/// Successful result of an action handler call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionOutcome {
    /// Text shown in the success notification
    pub message: String,
    /// Downloadable artifact produced by the step
    pub artifact_ref: Option<String>,
    /// Display values merged into the step's metadata
    pub metadata: Metadata,
}

impl ActionOutcome {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact_ref = Some(artifact.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A failed handler call, carrying the message shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionFailure {
    pub message: String,
}

impl ActionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A report fetched for a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLink {
    pub message: String,
    pub url: Option<String>,
}

/// The external action behind one step id.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Performs the step for `month`. `payload` carries the operator input
    /// of submit steps.
    async fn execute(
        &self,
        month: &str,
        payload: Option<&Value>,
    ) -> std::result::Result<ActionOutcome, ActionFailure>;
}

/// Read-only lookups shown next to the steps: process logs and reports.
#[async_trait]
pub trait Reporting: Send + Sync {
    async fn fetch_logs(&self, step_id: &StepId) -> std::result::Result<Vec<LogEntry>, ActionFailure>;

    async fn fetch_report(
        &self,
        step_id: &StepId,
        month: &str,
    ) -> std::result::Result<ReportLink, ActionFailure>;
}

/// Stand-in used when no reporting backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReporting;

#[async_trait]
impl Reporting for NoReporting {
    async fn fetch_logs(&self, _step_id: &StepId) -> std::result::Result<Vec<LogEntry>, ActionFailure> {
        Err(ActionFailure::new("Process logs are not available"))
    }

    async fn fetch_report(
        &self,
        _step_id: &StepId,
        _month: &str,
    ) -> std::result::Result<ReportLink, ActionFailure> {
        Err(ActionFailure::new("Reports are not available"))
    }
}

/// Step id to handler mapping.
#[derive(Clone, Default)]
pub struct ActionHandlers {
    handlers: HashMap<StepId, Arc<dyn ActionHandler>>,
}

impl ActionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `id`, replacing an earlier registration.
    pub fn insert(&mut self, id: impl Into<StepId>, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(id.into(), handler);
    }

    pub fn with(mut self, id: impl Into<StepId>, handler: Arc<dyn ActionHandler>) -> Self {
        self.insert(id, handler);
        self
    }

    /// Handler for `id`.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::MissingHandler` when nothing is registered.
    pub fn get(&self, id: &str) -> Result<Arc<dyn ActionHandler>> {
        self.handlers
            .get(id)
            .cloned()
            .ok_or_else(|| CycleError::MissingHandler { id: id.to_string() })
    }

    /// Checks that every step of `registry` has a handler.
    pub fn validate(&self, registry: &StepRegistry) -> Result<()> {
        match registry.ids().find(|id| !self.handlers.contains_key(*id)) {
            Some(id) => Err(CycleError::MissingHandler { id: id.to_string() }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ActionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.handlers.keys().map(StepId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ActionHandlers").field("steps", &ids).finish()
    }
}
