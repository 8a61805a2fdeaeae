//! Speech output resource: the single channel through which prompts become
//! audible.
//!
//! # Overview
//!
//! [`SpeechOutput`] is the seam to the platform synthesiser. It is
//! object-safe and `Send + Sync` so the session can hold it behind an
//! `Arc<dyn SpeechOutput>`. At most one utterance is in flight at a time;
//! `speak` returns immediately with a [`SpeechCompletion`] that resolves when
//! the utterance ends.
//!
//! [`MockSpeechOutput`] (available under `#[cfg(test)]`) records what was
//! spoken and lets a test decide when each utterance finishes.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::config::CoachSettings;
use crate::prompt::{Priority, QueuedPrompt};

// ---------------------------------------------------------------------------
// SpeechError / SpeechOutcome
// ---------------------------------------------------------------------------

/// `speak` could not start an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// Another utterance is still playing.
    #[error("speech output is busy")]
    Busy,

    /// The synthesiser is not available (audio session lost, no voice, ...).
    #[error("speech output unavailable: {0}")]
    Unavailable(String),
}

/// How an utterance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Finished,
    /// Cut off by [`SpeechOutput::interrupt`].
    Interrupted,
    Failed(String),
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// A request to speak one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub priority: Priority,
    /// Rate multiplier (`1.0` = normal).
    pub rate: f32,
    /// Platform voice identifier; `None` uses the default voice.
    pub voice: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into(),
            priority,
            rate: 1.0,
            voice: None,
        }
    }

    /// Utterance for `prompt` using the rate and voice from `settings`.
    pub fn from_prompt(prompt: &QueuedPrompt, settings: &CoachSettings) -> Self {
        Self {
            text: prompt.message.clone(),
            priority: prompt.priority,
            rate: settings.speech_rate,
            voice: settings.voice_identifier.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechCompletion
// ---------------------------------------------------------------------------

/// Resolves once with the [`SpeechOutcome`] of one utterance.
#[derive(Debug)]
pub struct SpeechCompletion {
    rx: oneshot::Receiver<SpeechOutcome>,
}

impl SpeechCompletion {
    /// A completion and the sender an implementation uses to resolve it.
    pub fn channel() -> (oneshot::Sender<SpeechOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Wait for the outcome. A sender dropped without reporting counts as a
    /// failure.
    pub async fn wait(self) -> SpeechOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| SpeechOutcome::Failed("utterance dropped without outcome".into()))
    }
}

// ---------------------------------------------------------------------------
// SpeechOutput trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the speech synthesiser.
///
/// # Contract
///
/// - `speak` never blocks; playback runs in the background.
/// - `speak` while busy returns [`SpeechError::Busy`].
/// - `interrupt` stops the in-flight utterance, whose completion then
///   resolves to [`SpeechOutcome::Interrupted`]. It is a no-op when idle.
pub trait SpeechOutput: Send + Sync {
    fn is_busy(&self) -> bool;

    fn speak(&self, utterance: Utterance) -> Result<SpeechCompletion, SpeechError>;

    fn interrupt(&self);
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechOutput>) {}
};

// ---------------------------------------------------------------------------
// MockSpeechOutput (test only)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::MockSpeechOutput;

#[cfg(test)]
mod mock {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Inner {
        spoken: Vec<Utterance>,
        in_flight: Option<oneshot::Sender<SpeechOutcome>>,
        interrupts: usize,
    }

    /// Records utterances; each stays in flight until [`finish`](Self::finish)
    /// or `interrupt` is called.
    #[derive(Default)]
    pub struct MockSpeechOutput {
        inner: Mutex<Inner>,
        unavailable: bool,
    }

    impl MockSpeechOutput {
        pub fn new() -> Self {
            Self::default()
        }

        /// A mock whose `speak` always fails.
        pub fn failing() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn spoken_texts(&self) -> Vec<String> {
            let inner = self.inner.lock().expect("mock lock");
            inner.spoken.iter().map(|u| u.text.clone()).collect()
        }

        pub fn spoken(&self) -> Vec<Utterance> {
            self.inner.lock().expect("mock lock").spoken.clone()
        }

        pub fn interrupts(&self) -> usize {
            self.inner.lock().expect("mock lock").interrupts
        }

        /// Complete the in-flight utterance with `Finished`.
        pub fn finish(&self) {
            if let Some(tx) = self.inner.lock().expect("mock lock").in_flight.take() {
                let _ = tx.send(SpeechOutcome::Finished);
            }
        }
    }

    impl SpeechOutput for MockSpeechOutput {
        fn is_busy(&self) -> bool {
            self.inner.lock().expect("mock lock").in_flight.is_some()
        }

        fn speak(&self, utterance: Utterance) -> Result<SpeechCompletion, SpeechError> {
            if self.unavailable {
                return Err(SpeechError::Unavailable("mock".into()));
            }
            let mut inner = self.inner.lock().expect("mock lock");
            if inner.in_flight.is_some() {
                return Err(SpeechError::Busy);
            }
            let (tx, completion) = SpeechCompletion::channel();
            inner.spoken.push(utterance);
            inner.in_flight = Some(tx);
            Ok(completion)
        }

        fn interrupt(&self) {
            let mut inner = self.inner.lock().expect("mock lock");
            if let Some(tx) = inner.in_flight.take() {
                inner.interrupts += 1;
                let _ = tx.send(SpeechOutcome::Interrupted);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
