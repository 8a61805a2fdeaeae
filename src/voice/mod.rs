//! Voice interaction: intent parsing, conversation context and the
//! turn-taking coordinator.

pub mod context;
pub mod coordinator;
pub mod intent;

pub use context::{ConversationContext, QuestionCategory};
pub use coordinator::{ActivationSource, StatsView, VoiceAction, VoiceCoordinator, VoiceState};
pub use intent::{Intent, IntentParser, Sentiment, StatsMetric};
