//! Step descriptor definition and the step identifier newtype.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

use super::ActionType;

/// Stable identifier of a step (e.g. `incentive-validation`).
///
/// Step ordering comes from the registry sequence, never from the id text;
/// `Ord` only exists so ids can live in sorted sets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StepId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for StepId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Immutable description of one step of the payroll cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepDescriptor {
    /// Unique identifier for the step
    pub id: StepId,

    /// Display title
    pub title: String,

    /// Display description
    pub description: String,

    /// Whether the step is run directly or submitted after acknowledgement
    pub action_type: ActionType,

    /// Whether an acknowledgement checkbox is shown
    pub requires_checkbox: bool,

    /// Whether execution additionally waits for an external verification
    pub requires_external_verification: bool,

    /// Whether an informational note is available
    #[serde(default)]
    pub has_info: bool,

    /// Label of the report attached to this step, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_link: Option<String>,

    /// Processing period this descriptor applies to
    pub month: String,
}

impl StepDescriptor {
    /// Creates a `run` step with no checkbox, verification, info or report.
    pub fn run(
        id: impl Into<StepId>,
        title: impl Into<String>,
        description: impl Into<String>,
        month: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            action_type: ActionType::Run,
            requires_checkbox: false,
            requires_external_verification: false,
            has_info: false,
            report_link: None,
            month: month.into(),
        }
    }

    /// Creates a `submit` step; submit steps always show the checkbox.
    pub fn submit(
        id: impl Into<StepId>,
        title: impl Into<String>,
        description: impl Into<String>,
        month: impl Into<String>,
    ) -> Self {
        Self {
            action_type: ActionType::Submit,
            requires_checkbox: true,
            ..Self::run(id, title, description, month)
        }
    }

    pub fn with_external_verification(mut self) -> Self {
        self.requires_external_verification = true;
        self
    }

    pub fn with_info(mut self) -> Self {
        self.has_info = true;
        self
    }

    pub fn with_report(mut self, label: impl Into<String>) -> Self {
        self.report_link = Some(label.into());
        self
    }
}
