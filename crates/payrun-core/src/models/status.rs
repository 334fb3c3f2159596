//! Status enumerations for steps and the board.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of step lifecycle states.
///
/// `Pending → Running → {Completed, Error}`; `Error → Running` is a retry and
/// `Completed` only goes away through a whole-cycle reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step has not been executed in this cycle
    #[default]
    Pending,

    /// Step is executing against its action handler
    Running,

    /// Step finished successfully
    Completed,

    /// Last execution failed; the step can be re-run
    Error,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "completed" => Ok(StepStatus::Completed),
            "error" => Ok(StepStatus::Error),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl StepStatus {
    /// Convert to the persisted string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
        }
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use payrun_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(StepStatus::Running.with_icon(), "➤ Running");
    /// assert_eq!(StepStatus::Pending.with_icon(), "○ Pending");
    /// assert_eq!(StepStatus::Error.with_icon(), "✗ Error");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Completed => "✓ Completed",
            StepStatus::Running => "➤ Running",
            StepStatus::Pending => "○ Pending",
            StepStatus::Error => "✗ Error",
        }
    }
}

/// How a step is triggered by the operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Plain execution, no acknowledgement needed
    Run,

    /// Execution gated on the acknowledgement checkbox
    Submit,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Run => "run",
            ActionType::Submit => "submit",
        }
    }

    /// Verb used in confirmation and error messages.
    pub fn verb(&self) -> &'static str {
        match self {
            ActionType::Run => "run",
            ActionType::Submit => "submit",
        }
    }

    /// Gerund used in error messages ("before running this step").
    pub fn gerund(&self) -> &'static str {
        match self {
            ActionType::Run => "running",
            ActionType::Submit => "submitting",
        }
    }
}

/// Layout used to present the step board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Cards,
    Table,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cards" => Ok(ViewMode::Cards),
            "table" => Ok(ViewMode::Table),
            _ => Err(format!("Invalid view mode: {s}")),
        }
    }
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Cards => "cards",
            ViewMode::Table => "table",
        }
    }
}
