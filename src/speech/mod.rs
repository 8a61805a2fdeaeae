//! Speech in and out: the synthesiser and recognizer seams.
//!
//! - [`output`]: [`SpeechOutput`], [`Utterance`] and [`SpeechCompletion`]
//! - [`console`]: [`ConsoleSpeech`], a log-backed output
//! - [`recognizer`]: [`SpeechRecognizer`] and [`listen_for_final`]

pub mod console;
pub mod output;
pub mod recognizer;

pub use console::ConsoleSpeech;
#[cfg(test)]
pub use output::MockSpeechOutput;
pub use output::{SpeechCompletion, SpeechError, SpeechOutcome, SpeechOutput, Utterance};
pub use recognizer::{
    listen_for_final, ListenOutcome, RecognitionError, ScriptedRecognizer, ScriptedReply,
    SpeechRecognizer, TranscriptEvent,
};
