//! Conversation context carried between voice turns.
//!
//! The context is forgotten after `silence` without a turn (default 120 s).
//! At most one question is pending; arming a new one replaces the old.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::voice::intent::Intent;

/// The kind of question the coach is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    HowDoYouFeel,
}

#[derive(Debug, Clone)]
pub struct ConversationContext {
    pending_question: Option<QuestionCategory>,
    last_intent: Option<Intent>,
    turn_count: u32,
    /// `None` while the context is empty.
    expires_at: Option<Instant>,
    /// When the last question was answered; opens the feeling grace window.
    answered_at: Option<Instant>,
    silence: Duration,
    grace: Duration,
}

impl ConversationContext {
    pub fn new(silence: Duration, grace: Duration) -> Self {
        Self {
            pending_question: None,
            last_intent: None,
            turn_count: 0,
            expires_at: None,
            answered_at: None,
            silence,
            grace,
        }
    }

    pub fn set_windows(&mut self, silence: Duration, grace: Duration) {
        self.silence = silence;
        self.grace = grace;
    }

    pub fn pending_question(&self) -> Option<QuestionCategory> {
        self.pending_question
    }

    pub fn last_intent(&self) -> Option<Intent> {
        self.last_intent
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn is_empty(&self) -> bool {
        self.expires_at.is_none() && self.pending_question.is_none()
    }

    /// Start waiting for an answer to `question`.
    pub fn arm_question(&mut self, question: QuestionCategory, now: Instant) {
        self.pending_question = Some(question);
        self.answered_at = None;
        self.expires_at = Some(now + self.silence);
    }

    /// A question is pending, or one was answered within the grace window.
    pub fn expects_feeling(&self, now: Instant) -> bool {
        self.pending_question.is_some()
            || self
                .answered_at
                .is_some_and(|at| now.saturating_duration_since(at) <= self.grace)
    }

    /// Record a parsed turn and push the expiry out.
    pub fn record_turn(&mut self, intent: Intent, now: Instant) {
        self.turn_count += 1;
        self.last_intent = Some(intent);
        self.expires_at = Some(now + self.silence);
    }

    /// Clear the pending question and open the grace window.
    pub fn answer_question(&mut self, now: Instant) -> Option<QuestionCategory> {
        self.answered_at = Some(now);
        self.pending_question.take()
    }

    /// Reset when the silence window has passed. Returns `true` if it did.
    pub fn expire_if_silent(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) if now >= at => {
                log::debug!("voice: conversation context expired after silence");
                self.reset();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.pending_question = None;
        self.last_intent = None;
        self.turn_count = 0;
        self.expires_at = None;
        self.answered_at = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ConversationContext {
        ConversationContext::new(Duration::from_secs(120), Duration::from_secs(30))
    }

    #[test]
    fn armed_question_expects_feeling() {
        let now = Instant::now();
        let mut c = ctx();
        assert!(!c.expects_feeling(now));
        c.arm_question(QuestionCategory::HowDoYouFeel, now);
        assert!(c.expects_feeling(now));
        assert_eq!(c.pending_question(), Some(QuestionCategory::HowDoYouFeel));
    }

    #[test]
    fn grace_window_after_answer() {
        let now = Instant::now();
        let mut c = ctx();
        c.arm_question(QuestionCategory::HowDoYouFeel, now);
        assert_eq!(c.answer_question(now), Some(QuestionCategory::HowDoYouFeel));
        assert_eq!(c.pending_question(), None);

        assert!(c.expects_feeling(now + Duration::from_secs(30)));
        assert!(!c.expects_feeling(now + Duration::from_secs(31)));
    }

    #[test]
    fn expires_after_silence() {
        let now = Instant::now();
        let mut c = ctx();
        c.arm_question(QuestionCategory::HowDoYouFeel, now);
        c.record_turn(Intent::Unknown, now);
        assert_eq!(c.turn_count(), 1);

        assert!(!c.expire_if_silent(now + Duration::from_secs(119)));
        assert!(c.expire_if_silent(now + Duration::from_secs(120)));
        assert!(c.is_empty());
        assert_eq!(c.turn_count(), 0);
        assert_eq!(c.last_intent(), None);
    }

    #[test]
    fn turn_refreshes_expiry() {
        let now = Instant::now();
        let mut c = ctx();
        c.record_turn(Intent::Unknown, now);
        c.record_turn(Intent::Unknown, now + Duration::from_secs(100));
        assert!(!c.expire_if_silent(now + Duration::from_secs(150)));
        assert_eq!(c.turn_count(), 2);
    }
}
