//! Prompt value types shared by the trigger engine, the voice coordinator and
//! the speech output.

use crate::triggers::TriggerId;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Delivery priority, ordered `Low < Medium < High < Critical`.
///
/// Only `Critical` may interrupt an utterance that is already playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn is_critical(self) -> bool {
        self == Priority::Critical
    }
}

// ---------------------------------------------------------------------------
// PromptSource / PromptCategory
// ---------------------------------------------------------------------------

/// Who produced a prompt. Used for de-duplication in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptSource {
    Trigger(TriggerId),
    /// A reply produced by the voice coordinator, keyed by voice turn.
    Voice(u64),
    /// A host announcement; the number keeps each announcement distinct.
    Announcement(u64),
}

/// What kind of message a prompt carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptCategory {
    Split,
    PaceDrift,
    ZoneTransition,
    ZoneDuration,
    CheckIn,
    StatsReply,
    Confirmation,
    Clarification,
    Announcement,
}

// ---------------------------------------------------------------------------
// QueuedPrompt
// ---------------------------------------------------------------------------

/// A candidate spoken message.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPrompt {
    pub message: String,
    pub priority: Priority,
    /// Run time (seconds) at which the prompt was created.
    pub created_at_secs: f64,
    pub source: PromptSource,
    pub category: PromptCategory,
    /// Arrival order, assigned by the queue.
    pub(crate) sequence: u64,
}

impl QueuedPrompt {
    pub fn new(
        message: impl Into<String>,
        priority: Priority,
        created_at_secs: f64,
        source: PromptSource,
        category: PromptCategory,
    ) -> Self {
        Self {
            message: message.into(),
            priority,
            created_at_secs,
            source,
            category,
            sequence: 0,
        }
    }

    /// Arrival order within the queue (`0` until enqueued).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
