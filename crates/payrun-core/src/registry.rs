//! Ordered catalog of step descriptors.
//!
//! The position of a descriptor in the registry is the only ordering the
//! engine knows about. There is no dependency graph and no priority field.

use std::collections::HashSet;

use jiff::civil::Date;

use crate::{
    error::{CycleError, Result},
    models::{StepDescriptor, StepId, StepState},
};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Fixed, ordered list of step descriptors for one processing month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRegistry {
    descriptors: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// Builds a registry from an explicit descriptor sequence.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::InvalidInput` when the sequence is empty or holds
    /// duplicate ids, or when more than one step asks for external
    /// verification.
    pub fn new(descriptors: Vec<StepDescriptor>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(CycleError::invalid_input("steps").with_reason("a cycle needs at least one step"));
        }

        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.id.as_str()) {
                return Err(CycleError::invalid_input("steps")
                    .with_reason(format!("duplicate step id '{}'", descriptor.id)));
            }
        }

        let gated = descriptors
            .iter()
            .filter(|d| d.requires_external_verification)
            .count();
        if gated > 1 {
            return Err(CycleError::invalid_input("steps")
                .with_reason("only one step may require external verification"));
        }

        Ok(Self { descriptors })
    }

    /// The payroll catalog for `month` (e.g. `"January 2026"`).
    pub fn payroll(month: &str) -> Self {
        let name = month_name(month);
        let descriptors = vec![
            StepDescriptor::submit(
                "incentive-validation",
                format!("Incentive Final Type Validation for {name}"),
                "Validates incentive final types before processing",
                month,
            ),
            StepDescriptor::run(
                "incentive-calculation",
                "Incentive Calculation Microsoft",
                "Calculates incentives for all eligible employees",
                month,
            )
            .with_external_verification()
            .with_report("Incentive Calculation Report"),
            StepDescriptor::run(
                "performance-incentive",
                "Performance Incentive Microsoft (Push to GreytHR)",
                "Pushes performance incentive data to GreytHR system",
                month,
            ),
            StepDescriptor::submit(
                "arrears-deductions",
                format!("Arrears/Deductions (+/-) for {name}"),
                "Processes arrears and deductions adjustments",
                month,
            )
            .with_info(),
            StepDescriptor::submit(
                "leave-requests",
                format!("Leave Requests reviewed on GreytHR for {name}"),
                "Reviews and processes leave requests from GreytHR",
                month,
            ),
            StepDescriptor::run(
                "lop-push",
                "LOP (Push to GreytHR)",
                "Pushes Loss of Pay data to GreytHR system",
                month,
            )
            .with_info(),
            StepDescriptor::run(
                "bank-transfer",
                "Bank File Transfer",
                "Generates and transfers bank files for salary disbursement",
                month,
            ),
            StepDescriptor::run(
                "salary-statement",
                "Salary Statement",
                "Generates salary statements for all employees",
                month,
            ),
        ];
        Self { descriptors }
    }

    /// Same catalog, re-labelled for another month.
    ///
    /// Titles of the form "... for <Month>" follow the new month name.
    pub fn for_month(&self, month: &str) -> Self {
        let new_name = month_name(month);
        let descriptors = self
            .descriptors
            .iter()
            .map(|d| {
                let old_suffix = format!("for {}", month_name(&d.month));
                let title = match d.title.strip_suffix(&old_suffix) {
                    Some(head) => format!("{head}for {new_name}"),
                    None => d.title.clone(),
                };
                StepDescriptor {
                    title,
                    month: month.to_string(),
                    ..d.clone()
                }
            })
            .collect();
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[StepDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Sequence position of `id`.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.id.as_str() == id)
    }

    pub fn get(&self, id: &str) -> Option<&StepDescriptor> {
        self.descriptors.iter().find(|d| d.id.as_str() == id)
    }

    /// The single step gated on external verification, if the catalog has one.
    pub fn verification_step(&self) -> Option<&StepDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.requires_external_verification)
    }

    pub fn ids(&self) -> impl Iterator<Item = &StepId> {
        self.descriptors.iter().map(|d| &d.id)
    }

    /// Fresh state for every descriptor: pending, unchecked.
    ///
    /// This is the only way `completed` and `error` are ever cleared.
    pub fn initial_states(&self) -> Vec<StepState> {
        self.descriptors
            .iter()
            .map(|d| StepState::initial(d.id.clone()))
            .collect()
    }
}

fn month_name(month: &str) -> &str {
    month.split_whitespace().next().unwrap_or(month)
}

/// Formats a month key such as `"January 2026"`.
pub fn month_label(date: Date) -> String {
    let index = usize::try_from(date.month() - 1).unwrap_or(0);
    format!("{} {}", MONTH_NAMES[index % 12], date.year())
}

/// The month containing `today` and the two that follow.
pub fn available_months(today: Date) -> Vec<String> {
    let first = today.first_of_month();
    (0..3)
        .filter_map(|offset| first.checked_add(jiff::Span::new().months(offset)).ok())
        .map(month_label)
        .collect()
}
