//! Markdown rendering of the board, dialogs and summaries.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers here add context the models do not carry themselves.
//!
//! - [`board`]: [`StepBoard`] and [`StepView`], the step list as cards or a
//!   table
//! - [`datetime`]: [`LocalDateTime`], timestamps in the system time zone
//! - [`models`]: `Display` for statuses, health, log entries and modals
//!
//! Everything renders to markdown so the CLI can pass it straight to its
//! terminal renderer.

pub mod board;
pub mod datetime;
pub mod models;

pub use board::{StepBoard, StepView};
pub use datetime::LocalDateTime;
