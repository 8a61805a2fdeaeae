//! Log-backed [`SpeechOutput`] for headless runs and the demo binary.
//!
//! Each utterance is written to the log and "plays" for a duration derived
//! from its word count and rate, on a spawned tokio task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::speech::output::{SpeechCompletion, SpeechError, SpeechOutcome, SpeechOutput, Utterance};

/// Words per minute at rate `1.0`.
const BASE_WORDS_PER_MINUTE: f64 = 170.0;

struct InFlight {
    id: u64,
    tx: oneshot::Sender<SpeechOutcome>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    in_flight: Option<InFlight>,
}

/// Speech output that logs instead of synthesising audio.
///
/// Must be used from inside a tokio runtime.
pub struct ConsoleSpeech {
    state: Arc<Mutex<State>>,
    words_per_minute: f64,
}

impl Default for ConsoleSpeech {
    fn default() -> Self {
        Self::new(BASE_WORDS_PER_MINUTE)
    }
}

impl ConsoleSpeech {
    pub fn new(words_per_minute: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            words_per_minute: words_per_minute.max(1.0),
        }
    }

    /// Simulated playback time of `utterance`.
    pub fn playback_duration(&self, utterance: &Utterance) -> Duration {
        let words = utterance.text.split_whitespace().count().max(1) as f64;
        let rate = if utterance.rate.is_finite() && utterance.rate > 0.0 {
            f64::from(utterance.rate)
        } else {
            1.0
        };
        Duration::from_secs_f64(words * 60.0 / (self.words_per_minute * rate))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<State>) -> std::sync::MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SpeechOutput for ConsoleSpeech {
    fn is_busy(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    fn speak(&self, utterance: Utterance) -> Result<SpeechCompletion, SpeechError> {
        let playback = self.playback_duration(&utterance);
        let (tx, completion) = SpeechCompletion::channel();

        let id = {
            let mut state = self.lock();
            if state.in_flight.is_some() {
                return Err(SpeechError::Busy);
            }
            state.next_id += 1;
            let id = state.next_id;
            state.in_flight = Some(InFlight { id, tx });
            id
        };

        log::info!(
            "speech: [{}] \"{}\" ({:.1}s)",
            utterance.priority.label(),
            utterance.text,
            playback.as_secs_f64()
        );

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(playback).await;
            let mut state = lock_state(&state);
            if state.in_flight.as_ref().is_some_and(|f| f.id == id) {
                if let Some(done) = state.in_flight.take() {
                    let _ = done.tx.send(SpeechOutcome::Finished);
                }
            }
        });

        Ok(completion)
    }

    fn interrupt(&self) {
        if let Some(flight) = self.lock().in_flight.take() {
            log::info!("speech: interrupted utterance {}", flight.id);
            let _ = flight.tx.send(SpeechOutcome::Interrupted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Priority;

    #[test]
    fn playback_scales_with_words_and_rate() {
        let speech = ConsoleSpeech::new(60.0);
        let mut u = Utterance::new("one two three", Priority::Low);
        assert_eq!(speech.playback_duration(&u), Duration::from_secs(3));
        u.rate = 2.0;
        assert_eq!(speech.playback_duration(&u), Duration::from_secs_f64(1.5));
    }

    #[tokio::test]
    async fn utterance_finishes_after_playback() {
        let speech = ConsoleSpeech::new(60_000.0);
        let completion = speech.speak(Utterance::new("hi", Priority::Low)).unwrap();
        assert!(speech.is_busy());
        assert_eq!(completion.wait().await, SpeechOutcome::Finished);
        assert!(!speech.is_busy());
    }

    #[tokio::test]
    async fn interrupt_resolves_in_flight() {
        let speech = ConsoleSpeech::new(1.0);
        let completion = speech.speak(Utterance::new("long", Priority::Low)).unwrap();
        assert!(matches!(
            speech.speak(Utterance::new("other", Priority::Critical)),
            Err(SpeechError::Busy)
        ));
        speech.interrupt();
        assert_eq!(completion.wait().await, SpeechOutcome::Interrupted);

        // A fresh utterance is accepted once the old one is gone.
        assert!(speech.speak(Utterance::new("next", Priority::Critical)).is_ok());
    }
}
