//! Session lifecycle phase and the status snapshot shared with the host UI.
//!
//! [`CoachStatus`] is what a host screen needs to render the coach: phase,
//! voice state, the last spoken message, queue depth and any triggers that
//! were disabled by a fault. The session loop is the only writer.

use std::sync::{Arc, Mutex};

use crate::voice::VoiceState;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Lifecycle of one coached run.
///
/// ```text
/// NotStarted ──start──▶ Running ◀──resume── Paused
///                          │ ──pause──────────▶ │
///                          └──stop──▶ Stopped ◀─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    NotStarted,
    Running,
    Paused,
    Stopped,
}

impl SessionPhase {
    /// Running or paused.
    ///
    /// ```
    /// use runaway_coach::session::SessionPhase;
    ///
    /// assert!(SessionPhase::Paused.is_active());
    /// assert!(!SessionPhase::Stopped.is_active());
    /// ```
    pub fn is_active(self) -> bool {
        matches!(self, SessionPhase::Running | SessionPhase::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "Not started",
            SessionPhase::Running => "Running",
            SessionPhase::Paused => "Paused",
            SessionPhase::Stopped => "Stopped",
        }
    }
}

// ---------------------------------------------------------------------------
// CoachStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CoachStatus {
    pub phase: SessionPhase,
    pub voice: VoiceState,
    pub muted: bool,
    /// Most recent message handed to the speech output.
    pub last_spoken: Option<String>,
    pub queue_len: usize,
    /// Labels of triggers disabled for this session.
    pub faulted_triggers: Vec<String>,
    /// Run time of the latest snapshot.
    pub elapsed_secs: f64,
}

/// Thread-safe handle to [`CoachStatus`].
///
/// Lock for a short critical section only; never hold it across `.await`.
pub type SharedStatus = Arc<Mutex<CoachStatus>>;

pub fn new_shared_status() -> SharedStatus {
    Arc::new(Mutex::new(CoachStatus::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_not_started() {
        assert_eq!(SessionPhase::default(), SessionPhase::NotStarted);
        assert!(!SessionPhase::NotStarted.is_active());
        assert!(SessionPhase::Running.is_active());
    }

    #[test]
    fn labels() {
        assert_eq!(SessionPhase::Paused.label(), "Paused");
        assert_eq!(SessionPhase::Stopped.label(), "Stopped");
    }

    #[test]
    fn shared_status_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedStatus>();
    }

    #[test]
    fn shared_status_can_be_cloned_and_mutated() {
        let status = new_shared_status();
        let status2 = Arc::clone(&status);
        status.lock().unwrap().phase = SessionPhase::Running;
        assert_eq!(status2.lock().unwrap().phase, SessionPhase::Running);
        assert_eq!(status2.lock().unwrap().voice, VoiceState::Idle);
    }
}
