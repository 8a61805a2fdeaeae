//! Speech recognition seam and the bounded listening window.
//!
//! [`SpeechRecognizer::start_listening`] hands back a stream of partial and
//! final transcripts. [`listen_for_final`] waits for the final one under a
//! timeout, so a listening window always resolves to exactly one
//! [`ListenOutcome`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One event on a transcript stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Partial(String),
    Final(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("recognizer unavailable: {0}")]
    Unavailable(String),

    #[error("recognition failed: {0}")]
    Failed(String),
}

/// Result of one listening window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Transcript(String),
    TimedOut,
    Failed(String),
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Platform speech-to-text.
///
/// The recognizer is expected to stop on its own once it has sent a final
/// transcript or once the receiver is dropped.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn start_listening(
        &self,
        timeout: Duration,
    ) -> Result<mpsc::Receiver<TranscriptEvent>, RecognitionError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

/// Open a listening window and wait up to `timeout` for a final transcript.
///
/// The timeout covers starting the recognizer as well as waiting for the
/// final result. Partial transcripts are logged and otherwise ignored. A
/// stream that ends without a final transcript counts as a failure.
pub async fn listen_for_final(recognizer: &dyn SpeechRecognizer, timeout: Duration) -> ListenOutcome {
    let window = async {
        let mut rx = match recognizer.start_listening(timeout).await {
            Ok(rx) => rx,
            Err(e) => return ListenOutcome::Failed(e.to_string()),
        };
        while let Some(event) = rx.recv().await {
            match event {
                TranscriptEvent::Partial(text) => log::debug!("recognizer: partial \"{text}\""),
                TranscriptEvent::Final(text) => return ListenOutcome::Transcript(text),
            }
        }
        ListenOutcome::Failed("transcript stream ended without a final result".into())
    };

    match tokio::time::timeout(timeout, window).await {
        Ok(outcome) => outcome,
        Err(_) => ListenOutcome::TimedOut,
    }
}

// ---------------------------------------------------------------------------
// ScriptedRecognizer
// ---------------------------------------------------------------------------

/// What a [`ScriptedRecognizer`] does for one listening window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Emit the first word as a partial, then the whole text as final.
    Say(String),
    /// Keep the stream open without sending anything.
    Silence,
    Fail(String),
}

/// Recognizer that replays a fixed script, one reply per window.
///
/// Used by the demo binary and in tests. Once the script runs out every
/// window is silent.
#[derive(Default)]
pub struct ScriptedRecognizer {
    replies: Mutex<VecDeque<ScriptedReply>>,
    /// Senders of silent windows, kept alive so the stream stays open.
    held: Mutex<Vec<mpsc::Sender<TranscriptEvent>>>,
}

impl ScriptedRecognizer {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(reply);
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start_listening(
        &self,
        _timeout: Duration,
    ) -> Result<mpsc::Receiver<TranscriptEvent>, RecognitionError> {
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or(ScriptedReply::Silence);

        let (tx, rx) = mpsc::channel(4);
        match reply {
            ScriptedReply::Say(text) => {
                if let Some(first) = text.split_whitespace().next() {
                    let _ = tx.try_send(TranscriptEvent::Partial(first.to_string()));
                }
                let _ = tx.try_send(TranscriptEvent::Final(text));
            }
            ScriptedReply::Silence => {
                let mut held = self.held.lock().unwrap_or_else(|p| p.into_inner());
                held.retain(|tx| !tx.is_closed());
                held.push(tx);
            }
            ScriptedReply::Fail(reason) => return Err(RecognitionError::Failed(reason)),
        }
        Ok(rx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
