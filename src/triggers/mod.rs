//! Coaching triggers: rules that decide from the run state whether to speak.
//!
//! - [`trigger`]: the [`Trigger`] record (cooldown, enabled, faulted)
//! - [`kind`]: the closed [`TriggerKind`] enum and [`EvalContext`]
//! - [`set`]: the [`TriggerSet`] arena
//! - one module per variant: [`split`], [`pace`], [`zone`], [`check_in`]

pub mod check_in;
pub mod kind;
pub mod pace;
pub mod set;
pub mod split;
pub mod trigger;
pub mod zone;

pub use check_in::CheckInTrigger;
pub use kind::{EvalContext, TriggerKind, TriggerParams, TriggerTag};
pub use pace::PaceDriftTrigger;
pub use set::TriggerSet;
pub use split::SplitTrigger;
pub use trigger::{Trigger, TriggerError, TriggerId};
pub use zone::{ZoneDurationTrigger, ZoneTransitionTrigger};
