//! Core library for the payrun payroll cycle runner.
//!
//! A payroll cycle is a fixed, ordered list of steps. Each step runs an
//! external action (validate incentives, push LOP to GreytHR, transfer bank
//! files, ...). The crate enforces the rules around those actions:
//!
//! - **Linear gating** ([`gating`]): a step is enabled only when every step
//!   before it is completed
//! - **Single-flight execution** ([`orchestrator`]): a running step cannot be
//!   started again, and every execution is confirmed first
//! - **Verification gate** ([`verification`]): one step additionally waits
//!   for its report to be verified in an external flow
//! - **Durable progress** ([`store`], [`db`]): every change is written
//!   through to a key/value store and restored on the next start
//!
//! Operator feedback goes through a single-slot [`modal`] controller, and
//! [`display`] renders the board and dialogs as markdown.
//!
//! # Quick Start
//!
//! ```rust
//! use payrun_core::{
//!     handler::SimulatedPayroll, models::StepStatus, store::MemoryStore, ConfirmOutcome,
//!     CycleBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SimulatedPayroll::default();
//! let cycle = CycleBuilder::new()
//!     .with_store(MemoryStore::new())
//!     .with_month("January 2026")
//!     .with_handlers(backend.handlers())
//!     .with_reporting(backend)
//!     .build()
//!     .await?;
//!
//! // Submit steps need their acknowledgement box ticked first.
//! cycle.set_checked("incentive-validation", true)?;
//! cycle.request_execute("incentive-validation")?;
//! let outcome = cycle.confirm().await?;
//! assert!(matches!(outcome, ConfirmOutcome::Executed(_)));
//! assert_eq!(cycle.step("incentive-validation")?.status, StepStatus::Completed);
//!
//! println!("{}", cycle.board());
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod error;
pub mod gating;
pub mod handler;
pub mod modal;
pub mod models;
pub mod orchestrator;
pub mod precondition;
pub mod registry;
pub mod store;
pub mod verification;

// Re-export commonly used types
pub use db::Database;
pub use display::{LocalDateTime, StepBoard, StepView};
pub use error::{CycleError, Result};
pub use handler::{ActionFailure, ActionHandler, ActionHandlers, ActionOutcome, Reporting};
pub use modal::{ConfirmAction, Modal, ModalKind};
pub use models::{
    ActionType, CycleHealth, CycleSnapshot, HealthStatus, LogEntry, LogLevel, StepDescriptor,
    StepId, StepState, StepStatus, ViewMode,
};
pub use orchestrator::{
    ConfirmOutcome, CycleBuilder, ExecutionOutcome, Orchestrator, RequestOutcome, VerifyOutcome,
};
pub use precondition::Precondition;
pub use registry::StepRegistry;
pub use verification::{VerificationEvent, VerificationOutcome};
