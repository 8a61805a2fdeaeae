//! Session wiring: the tick loop, host hooks and host-facing seams.
//!
//! # Architecture
//!
//! ```text
//! CoachHandle (host) ──mpsc──▶ CoachSession::run()  ← async tokio task
//!                                   │
//!                                   ├─ tick      → RunStateProvider → CoachEngine → SpeechOutput
//!                                   ├─ voice     → SpeechRecognizer → VoiceCoordinator
//!                                   │                 ├─ commands → SessionControl
//!                                   │                 └─ feelings → FeelingJournal (spawn_blocking)
//!                                   └─ status    → SharedStatus (read by the host UI)
//! ```

pub mod control;
pub mod journal;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use control::{LoggingControl, SessionCommand, SessionControl};
pub use journal::{FeelingEntry, FeelingJournal, JournalError, JsonlFeelingJournal};
pub use runner::{coach_channel, CoachHandle, CoachMessage, CoachServices, CoachSession};
pub use state::{new_shared_status, CoachStatus, SessionPhase, SharedStatus};
