//! Display implementations for domain models.
//!
//! Kept apart from the model definitions; everything here produces markdown
//! for the terminal renderer.

use std::fmt;

use crate::{
    modal::Modal,
    models::{ActionType, CycleHealth, HealthStatus, LogEntry, LogLevel, StepStatus, ViewMode},
};

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for CycleHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- **Progress**: {}/{} steps completed ({:.1}%)",
            self.completed_steps, self.total_steps, self.completion_percentage
        )?;
        writeln!(f, "- **Health**: {}", self.overall)?;
        if self.error_steps > 0 {
            writeln!(f, "- **Failed steps**: {}", self.error_steps)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- `{}` **{}** {}",
            self.timestamp,
            self.level.as_str().to_uppercase(),
            self.message
        )
    }
}

impl fmt::Display for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modal::Confirm { title, message, .. } => {
                writeln!(f, "## {title}")?;
                writeln!(f)?;
                writeln!(f, "{message}")
            }
            Modal::Success {
                title,
                message,
                artifact,
            } => {
                writeln!(f, "## ✓ {title}")?;
                writeln!(f)?;
                writeln!(f, "{message}")?;
                if let Some(artifact) = artifact {
                    writeln!(f)?;
                    writeln!(f, "- **Download**: {artifact}")?;
                }
                Ok(())
            }
            Modal::Error { title, message } => {
                writeln!(f, "## ✗ {title}")?;
                writeln!(f)?;
                writeln!(f, "{message}")
            }
            Modal::Info { title, message } => {
                writeln!(f, "## ℹ {title}")?;
                writeln!(f)?;
                writeln!(f, "{message}")
            }
            Modal::Logs {
                title,
                entries,
                error,
                ..
            } => {
                writeln!(f, "## {title}")?;
                writeln!(f)?;
                if let Some(error) = error {
                    return writeln!(f, "Error loading logs: {error}");
                }
                if entries.is_empty() {
                    return writeln!(f, "No logs available.");
                }
                for entry in entries {
                    writeln!(f, "{entry}")?;
                }
                Ok(())
            }
        }
    }
}
