//! Prompts and the bounded priority queue that feeds the speech output.

pub mod queue;
pub mod types;

pub use queue::{EnqueueOutcome, PromptQueue};
pub use types::{Priority, PromptCategory, PromptSource, QueuedPrompt};
