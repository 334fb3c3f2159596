//! Data models for the payroll cycle.
//!
//! This module contains the domain types the engine works with. Display
//! implementations live in [`crate::display`] so the models stay free of
//! presentation concerns.
//!
//! - [`StepDescriptor`]: immutable catalog entry, ordered by the registry
//! - [`StepState`]: mutable lifecycle state joined to a descriptor by id
//! - [`CycleSnapshot`]: the persisted aggregate used to restore a session
//! - [`CycleHealth`]: progress summary for the board header
//!
//! # Examples
//!
//! ```rust
//! use payrun_core::models::{StepId, StepState, StepStatus};
//!
//! let state = StepState::initial(StepId::from("bank-transfer"));
//! assert_eq!(state.status, StepStatus::Pending);
//! assert!(!state.checked);
//! assert_eq!(state.metadata["Last Run"], "Not started");
//! ```

pub mod descriptor;
pub mod logs;
pub mod snapshot;
pub mod state;
pub mod status;
pub mod summary;


pub use descriptor::{StepDescriptor, StepId};
pub use logs::{LogEntry, LogLevel};
pub use snapshot::CycleSnapshot;
pub use state::{
    initial_metadata, Metadata, StepState, METADATA_ERRORS, METADATA_LAST_RUN, METADATA_PROCESSED,
    STALE_RUN_AFTER,
};
pub use status::{ActionType, StepStatus, ViewMode};
pub use summary::{CycleHealth, HealthStatus};
