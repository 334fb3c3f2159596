//! Canned payroll backend for development and demos.

use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use log::debug;
use serde_json::Value;

use super::{ActionFailure, ActionHandler, ActionHandlers, ActionOutcome, ReportLink, Reporting};
use crate::models::{LogEntry, LogLevel, StepId, METADATA_ERRORS, METADATA_PROCESSED};

/// Head count reported by every simulated step.
pub const SIMULATED_EMPLOYEES: u32 = 1245;

/// `(step id, success message, artifact)` for each simulated step.
const RESPONSES: [(&str, &str, Option<&str>); 8] = [
    ("incentive-validation", "Validation completed successfully", None),
    (
        "incentive-calculation",
        "Incentive calculation completed",
        Some("/reports/incentive.pdf"),
    ),
    ("performance-incentive", "Pushed to GreytHR successfully", None),
    ("arrears-deductions", "Arrears/Deductions submitted", None),
    ("leave-requests", "Leave requests review submitted", None),
    ("lop-push", "LOP pushed to GreytHR successfully", None),
    ("bank-transfer", "Bank file transfer completed", None),
    (
        "salary-statement",
        "Salary statement generated",
        Some("/reports/salary-statement.pdf"),
    ),
];

/// Simulated backend: every call sleeps for `latency` and then succeeds,
/// unless its step id was marked as failing.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPayroll {
    latency: Duration,
    failing: HashSet<StepId>,
}

impl SimulatedPayroll {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing: HashSet::new(),
        }
    }

    /// Makes every execution of `id` fail.
    pub fn failing(mut self, id: impl Into<StepId>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// One handler per payroll step.
    pub fn handlers(&self) -> ActionHandlers {
        RESPONSES
            .iter()
            .fold(ActionHandlers::new(), |handlers, (id, message, artifact)| {
                handlers.with(
                    *id,
                    Arc::new(SimulatedStep {
                        id: StepId::from(*id),
                        message: *message,
                        artifact: *artifact,
                        backend: self.clone(),
                    }),
                )
            })
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

struct SimulatedStep {
    id: StepId,
    message: &'static str,
    artifact: Option<&'static str>,
    backend: SimulatedPayroll,
}

#[async_trait]
impl ActionHandler for SimulatedStep {
    async fn execute(
        &self,
        month: &str,
        _payload: Option<&Value>,
    ) -> Result<ActionOutcome, ActionFailure> {
        debug!("Simulating '{}' for {month}", self.id);
        self.backend.delay().await;

        if self.backend.failing.contains(&self.id) {
            return Err(ActionFailure::new(format!(
                "Simulated failure while processing '{}'",
                self.id
            )));
        }

        let mut outcome = ActionOutcome::new(self.message)
            .with_metadata(METADATA_PROCESSED, format!("{SIMULATED_EMPLOYEES} employees"))
            .with_metadata(METADATA_ERRORS, "0");
        if let Some(artifact) = self.artifact {
            outcome = outcome.with_artifact(artifact);
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Reporting for SimulatedPayroll {
    async fn fetch_logs(&self, step_id: &StepId) -> Result<Vec<LogEntry>, ActionFailure> {
        self.delay().await;
        let timestamp = Timestamp::now().to_string();
        let entry = |level, message: &str| LogEntry {
            timestamp: timestamp.clone(),
            level,
            message: message.to_string(),
        };

        let mut entries = vec![
            entry(LogLevel::Info, "Process started"),
            entry(LogLevel::Info, "Validating data..."),
        ];
        if self.failing.contains(step_id) {
            entries.push(entry(LogLevel::Error, "Process failed"));
        } else {
            entries.push(entry(LogLevel::Success, "Process completed successfully"));
        }
        Ok(entries)
    }

    async fn fetch_report(&self, step_id: &StepId, month: &str) -> Result<ReportLink, ActionFailure> {
        self.delay().await;
        match step_id.as_str() {
            "incentive-calculation" => Ok(ReportLink {
                message: format!("Incentive Calculation Report for {month} generated successfully"),
                url: Some("/reports/incentive-calculation.pdf".to_string()),
            }),
            _ => Err(ActionFailure::new(format!(
                "No report is available for step '{step_id}'"
            ))),
        }
    }
}
