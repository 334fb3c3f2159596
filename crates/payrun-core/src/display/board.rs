//! Step board: the list of steps with their current gating result.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{
    ActionType, CycleHealth, StepDescriptor, StepState, StepStatus, ViewMode, METADATA_ERRORS,
    METADATA_PROCESSED,
};

/// One step as shown on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub descriptor: StepDescriptor,
    pub state: StepState,
    /// Linear gating result
    pub enabled: bool,
    /// An execution of this step is in progress right now
    pub in_flight: bool,
    /// The step waits on its report verification
    pub awaiting_verification: bool,
}

impl StepView {
    /// Status to show; an execution in progress always reads as running.
    pub fn status(&self) -> StepStatus {
        if self.in_flight {
            StepStatus::Running
        } else {
            self.state.status
        }
    }

    /// Short label for the action control.
    pub fn availability(&self) -> &'static str {
        match self.status() {
            StepStatus::Completed => "done",
            StepStatus::Running => "running",
            _ if !self.enabled => "locked",
            _ if self.awaiting_verification => "awaiting verification",
            StepStatus::Error => "ready to re-run",
            StepStatus::Pending => "ready",
        }
    }

    fn metadata(&self, key: &str) -> &str {
        self.state.metadata.get(key).map_or("-", String::as_str)
    }

    fn last_run(&self) -> String {
        match &self.state.last_run_at {
            Some(at) => LocalDateTime(at).to_string(),
            None => "Not started".to_string(),
        }
    }
}

/// Whole board, rendered as cards or as a table depending on `view_mode`.
///
/// # Examples
///
/// ```rust
/// use payrun_core::{
///     display::{StepBoard, StepView},
///     models::{CycleHealth, ViewMode},
///     registry::StepRegistry,
/// };
///
/// let registry = StepRegistry::payroll("January 2026");
/// let states = registry.initial_states();
/// let steps = registry
///     .descriptors()
///     .iter()
///     .zip(&states)
///     .enumerate()
///     .map(|(i, (descriptor, state))| StepView {
///         descriptor: descriptor.clone(),
///         state: state.clone(),
///         enabled: i == 0,
///         in_flight: false,
///         awaiting_verification: descriptor.requires_external_verification,
///     })
///     .collect();
///
/// let board = StepBoard {
///     month: "January 2026".to_string(),
///     view_mode: ViewMode::Table,
///     health: CycleHealth::from_states(&states),
///     steps,
/// };
/// let output = board.to_string();
/// assert!(output.contains("# Payroll Cycle: January 2026"));
/// assert!(output.contains("| 2 | Incentive Calculation Microsoft |"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StepBoard {
    pub month: String,
    pub view_mode: ViewMode,
    pub health: CycleHealth,
    pub steps: Vec<StepView>,
}

impl StepBoard {
    fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Payroll Cycle: {}", self.month)?;
        writeln!(f)?;
        write!(f, "{}", self.health)?;
        writeln!(f)
    }

    fn fmt_cards(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, step) in self.steps.iter().enumerate() {
            let descriptor = &step.descriptor;
            writeln!(
                f,
                "### {}. {} ({})",
                position + 1,
                descriptor.title,
                step.status().with_icon()
            )?;
            writeln!(f)?;
            writeln!(f, "{}", descriptor.description)?;
            writeln!(f)?;
            writeln!(f, "- **Id**: `{}`", descriptor.id)?;
            writeln!(f, "- **Action**: {} ({})", descriptor.action_type, step.availability())?;
            if descriptor.requires_checkbox {
                let mark = if step.state.checked { "[x]" } else { "[ ]" };
                writeln!(f, "- **Confirmed**: {mark}")?;
            }
            writeln!(f, "- **Processed**: {}", step.metadata(METADATA_PROCESSED))?;
            writeln!(f, "- **Errors**: {}", step.metadata(METADATA_ERRORS))?;
            writeln!(f, "- **Last Run**: {}", step.last_run())?;
            if let Some(report) = &descriptor.report_link {
                let note = if step.awaiting_verification {
                    " (not verified)"
                } else {
                    ""
                };
                writeln!(f, "- **Report**: {report}{note}")?;
            }
            if descriptor.has_info {
                writeln!(f, "- **Info**: available")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn fmt_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| # | Step | Status | Action | Processed | Last Run |")?;
        writeln!(f, "|---|------|--------|--------|-----------|----------|")?;
        for (position, step) in self.steps.iter().enumerate() {
            let action = match step.descriptor.action_type {
                ActionType::Submit if step.state.checked => "submit [x]",
                ActionType::Submit => "submit [ ]",
                ActionType::Run => "run",
            };
            writeln!(
                f,
                "| {} | {} | {} | {} ({}) | {} | {} |",
                position + 1,
                step.descriptor.title,
                step.status().with_icon(),
                action,
                step.availability(),
                step.metadata(METADATA_PROCESSED),
                step.last_run()
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for StepBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_header(f)?;
        if self.steps.is_empty() {
            return writeln!(f, "No steps in this cycle.");
        }
        match self.view_mode {
            ViewMode::Cards => self.fmt_cards(f),
            ViewMode::Table => self.fmt_table(f),
        }
    }
}
