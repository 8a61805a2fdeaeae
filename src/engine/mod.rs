//! Coaching engine: trigger evaluation and prompt scheduling.
//!
//! - [`scheduler`]: [`CoachEngine`], one synchronous tick at a time

pub mod scheduler;

pub use scheduler::{CoachEngine, Dispatch, FiredTrigger, TickReport};
