//! The trigger record: shared scheduling state around a [`TriggerKind`].

use thiserror::Error;

use crate::prompt::Priority;
use crate::triggers::kind::{EvalContext, TriggerKind, TriggerTag};

// ---------------------------------------------------------------------------
// TriggerId
// ---------------------------------------------------------------------------

/// Stable index of a trigger inside its [`TriggerSet`](crate::triggers::TriggerSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerId(pub(crate) usize);

impl TriggerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TriggerError
// ---------------------------------------------------------------------------

/// A trigger could not evaluate the current run state.
///
/// Any error disables the trigger for the rest of the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriggerError {
    #[error("invalid {metric}: {value}")]
    InvalidMetric { metric: &'static str, value: f64 },

    #[error("missing data: {0}")]
    MissingData(&'static str),
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// One entry of the trigger arena.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: TriggerId,
    pub kind: TriggerKind,
    pub priority: Priority,
    /// Minimum run time between two firings.
    pub cooldown_secs: f64,
    /// Run time of the last firing.
    pub last_fired_at: Option<f64>,
    /// Follows the live settings.
    pub enabled: bool,
    /// Set after an evaluation error; sticky for the session.
    pub faulted: bool,
}

impl Trigger {
    pub fn new(id: TriggerId, kind: TriggerKind, cooldown_secs: f64) -> Self {
        Self {
            id,
            priority: kind.default_priority(),
            kind,
            cooldown_secs,
            last_fired_at: None,
            enabled: true,
            faulted: false,
        }
    }

    pub fn tag(&self) -> TriggerTag {
        self.kind.tag()
    }

    /// Enabled and not faulted.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.faulted
    }

    /// `true` on first evaluation or once `cooldown_secs` of run time have
    /// passed since the last firing.
    pub fn cooldown_elapsed(&self, now_secs: f64) -> bool {
        match self.last_fired_at {
            None => true,
            Some(at) => now_secs - at >= self.cooldown_secs,
        }
    }

    /// Run one evaluation step at run time `now_secs`.
    ///
    /// Returns the prompt text when the trigger fires. Variant bookkeeping
    /// (`observe`) runs even while the cooldown is still pending.
    pub fn evaluate(
        &mut self,
        ctx: &EvalContext<'_>,
        now_secs: f64,
    ) -> Result<Option<String>, TriggerError> {
        self.kind.observe(ctx)?;

        if !self.cooldown_elapsed(now_secs) || !self.kind.should_fire(ctx)? {
            return Ok(None);
        }

        let message = self.kind.generate_prompt(ctx)?;
        self.last_fired_at = Some(now_secs);
        self.kind.on_fired(ctx);
        Ok(Some(message))
    }

    /// Forget variant progress (streaks, pending splits). Cooldown state is
    /// kept.
    pub fn reset_transient(&mut self) {
        self.kind.reset_transient();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
