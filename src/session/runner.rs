//! Session loop: drives the engine on a timer and carries out voice work.
//!
//! [`CoachSession`] owns the [`CoachEngine`] and the [`VoiceCoordinator`] and
//! responds to [`CoachMessage`]s sent through a [`CoachHandle`].
//!
//! # Loop
//!
//! ```text
//! select! {
//!   CoachMessage (mpsc)      → start / pause / resume / stop / voice / mute / announce
//!   interval tick            → provider.snapshot() → engine.tick() → spawn completion wait
//!   SessionEvent (internal)
//!     ├─ SpeechDone          → engine.on_speech_outcome, auto-listen after a check-in
//!     └─ Listen              → coordinator.on_transcript → VoiceActions
//! }
//! ```
//!
//! Handlers never await the speech output or the recognizer. Completions and
//! listening windows run on spawned tasks and report back as
//! [`SessionEvent`]s. Journal writes go through `spawn_blocking`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::{read_config, update_config, CoachSettings, SharedConfig};
use crate::engine::{CoachEngine, Dispatch};
use crate::prompt::{Priority, PromptCategory};
use crate::run::RunStateProvider;
use crate::speech::{listen_for_final, ListenOutcome, SpeechOutcome, SpeechOutput, SpeechRecognizer};
use crate::voice::{ActivationSource, QuestionCategory, Sentiment, StatsView, VoiceAction, VoiceCoordinator};

use super::control::{SessionCommand, SessionControl};
use super::journal::{FeelingEntry, FeelingJournal};
use super::state::{SessionPhase, SharedStatus};

const COMMAND_BUFFER: usize = 32;

// ---------------------------------------------------------------------------
// CoachMessage / CoachHandle
// ---------------------------------------------------------------------------

/// Requests from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum CoachMessage {
    Start(CoachSettings),
    Pause,
    Resume,
    Stop,
    ActivateVoice,
    SetMuted(bool),
    Announce { text: String, priority: Priority },
}

/// Host-side handle to a running [`CoachSession`].
///
/// Every method is fire-and-forget; a full or closed channel is logged.
#[derive(Debug, Clone)]
pub struct CoachHandle {
    tx: mpsc::Sender<CoachMessage>,
}

impl CoachHandle {
    pub fn on_session_start(&self, settings: CoachSettings) {
        self.send(CoachMessage::Start(settings));
    }

    pub fn on_session_pause(&self) {
        self.send(CoachMessage::Pause);
    }

    pub fn on_session_resume(&self) {
        self.send(CoachMessage::Resume);
    }

    pub fn on_session_stop(&self) {
        self.send(CoachMessage::Stop);
    }

    /// Open a listening window (button or gesture).
    pub fn activate_voice(&self) {
        self.send(CoachMessage::ActivateVoice);
    }

    pub fn set_muted(&self, muted: bool) {
        self.send(CoachMessage::SetMuted(muted));
    }

    /// Queue a host message, e.g. a safety warning at [`Priority::Critical`].
    pub fn announce(&self, text: impl Into<String>, priority: Priority) {
        self.send(CoachMessage::Announce {
            text: text.into(),
            priority,
        });
    }

    fn send(&self, message: CoachMessage) {
        if let Err(e) = self.tx.try_send(message) {
            log::warn!("session: could not deliver message to coach: {e}");
        }
    }
}

/// Create the channel between a [`CoachHandle`] and [`CoachSession::run`].
pub fn coach_channel() -> (CoachHandle, mpsc::Receiver<CoachMessage>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    (CoachHandle { tx }, rx)
}

// ---------------------------------------------------------------------------
// CoachServices
// ---------------------------------------------------------------------------

/// The host-provided collaborators.
#[derive(Clone)]
pub struct CoachServices {
    pub provider: Arc<dyn RunStateProvider>,
    pub speech: Arc<dyn SpeechOutput>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub control: Arc<dyn SessionControl>,
    pub journal: Arc<dyn FeelingJournal>,
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Results of spawned work, fed back into the loop.
#[derive(Debug)]
enum SessionEvent {
    SpeechDone {
        utterance_id: u64,
        outcome: SpeechOutcome,
    },
    Listen {
        generation: u64,
        outcome: ListenOutcome,
    },
}

// ---------------------------------------------------------------------------
// CoachSession
// ---------------------------------------------------------------------------

/// Runs one coached session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use runaway_coach::config::{new_shared_config, CoachConfig};
/// use runaway_coach::session::{coach_channel, new_shared_status, CoachServices, CoachSession};
///
/// # async fn example(services: CoachServices) {
/// let config = new_shared_config(CoachConfig::default());
/// let session = CoachSession::new(config, new_shared_status(), services);
/// let (handle, rx) = coach_channel();
///
/// let task = tokio::spawn(session.run(rx));
/// handle.on_session_start(Default::default());
/// // ...
/// handle.on_session_stop();
/// let _ = task.await;
/// # }
/// ```
pub struct CoachSession {
    config: SharedConfig,
    status: SharedStatus,
    services: CoachServices,
    engine: CoachEngine,
    voice: VoiceCoordinator,
    /// Bumped whenever a listening window opens or is abandoned.
    listen_generation: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl CoachSession {
    pub fn new(config: SharedConfig, status: SharedStatus, services: CoachServices) -> Self {
        let current = read_config(&config);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            engine: CoachEngine::new(Arc::clone(&config), Arc::clone(&services.speech)),
            voice: VoiceCoordinator::new(&current.voice, &current.coach),
            config,
            status,
            services,
            listen_generation: 0,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until a stop (host or voice) or until `commands` is closed.
    pub async fn run(mut self, mut commands: mpsc::Receiver<CoachMessage>) {
        let Some(mut events) = self.events_rx.take() else {
            log::error!("session: event channel already taken, not running");
            return;
        };

        let period = Duration::from_millis(read_config(&self.config).engine.tick_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let flow = tokio::select! {
                message = commands.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => {
                        log::info!("session: command channel closed");
                        ControlFlow::Break(())
                    }
                },
                _ = ticker.tick() => {
                    self.on_tick();
                    ControlFlow::Continue(())
                }
                Some(event) = events.recv() => self.on_event(event),
            };
            self.publish_status();

            if flow.is_break() {
                break;
            }
        }

        self.engine.stop();
        self.voice.force_idle();
        self.publish_status();
        log::info!("session: coach loop finished");
    }

    // -----------------------------------------------------------------------
    // Message handlers
    // -----------------------------------------------------------------------

    fn handle_message(&mut self, message: CoachMessage) -> ControlFlow<()> {
        log::debug!("session: {message:?}");
        match message {
            CoachMessage::Start(settings) => self.start(settings),
            CoachMessage::Pause => self.pause(),
            CoachMessage::Resume => self.engine.resume(),
            CoachMessage::Stop => return self.stop(),
            CoachMessage::ActivateVoice => self.activate(ActivationSource::User),
            CoachMessage::SetMuted(muted) => self.engine.set_muted(muted),
            CoachMessage::Announce { text, priority } => {
                self.engine.announce(text, priority);
                self.dispatch();
            }
        }
        ControlFlow::Continue(())
    }

    fn start(&mut self, settings: CoachSettings) {
        update_config(&self.config, |c| c.coach = settings);
        self.engine.start();
        self.cancel_listening();
        self.voice.reset();
        let current = self.engine.current_config();
        self.voice.apply_config(&current.voice, &current.coach);
        if let Ok(mut st) = self.status.lock() {
            st.last_spoken = None;
        }
    }

    fn pause(&mut self) {
        self.engine.pause();
        self.cancel_listening();
        self.voice.force_idle();
    }

    fn stop(&mut self) -> ControlFlow<()> {
        self.engine.stop();
        self.cancel_listening();
        self.voice.force_idle();
        ControlFlow::Break(())
    }

    fn on_tick(&mut self) {
        if !self.engine.phase().is_active() {
            return;
        }

        let snapshot = self.services.provider.snapshot();
        let report = self.engine.tick(snapshot);

        let current = self.engine.current_config();
        self.voice.apply_config(&current.voice, &current.coach);

        if let Some(dispatch) = report.dispatched {
            self.on_dispatched(dispatch);
        }
    }

    fn on_event(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::SpeechDone {
                utterance_id,
                outcome,
            } => {
                let category = self.engine.on_speech_outcome(utterance_id, &outcome);
                let check_in_done =
                    outcome == SpeechOutcome::Finished && category == Some(PromptCategory::CheckIn);
                if check_in_done && self.engine.phase() == SessionPhase::Running {
                    self.activate(ActivationSource::AutoAfterCheckIn);
                }
                self.dispatch();
                ControlFlow::Continue(())
            }
            SessionEvent::Listen {
                generation,
                outcome,
            } => {
                if generation != self.listen_generation {
                    log::debug!("session: ignoring outcome of abandoned listening window");
                    return ControlFlow::Continue(());
                }
                match outcome {
                    ListenOutcome::Transcript(text) => self.on_transcript(&text),
                    ListenOutcome::TimedOut => {
                        self.voice.on_listen_timeout();
                        ControlFlow::Continue(())
                    }
                    ListenOutcome::Failed(reason) => {
                        self.voice.on_recognition_error(&reason);
                        ControlFlow::Continue(())
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Voice
    // -----------------------------------------------------------------------

    fn activate(&mut self, source: ActivationSource) {
        if !self.engine.phase().is_active() {
            log::debug!("session: no session in progress, not listening");
            return;
        }
        if !self.voice.activate(source, Instant::now()) {
            return;
        }

        self.listen_generation += 1;
        let generation = self.listen_generation;
        let timeout = Duration::from_secs(self.engine.current_config().voice.listen_timeout_secs);
        let recognizer = Arc::clone(&self.services.recognizer);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = listen_for_final(recognizer.as_ref(), timeout).await;
            let _ = tx.send(SessionEvent::Listen { generation, outcome });
        });
    }

    /// Outcomes of any open window will be ignored.
    fn cancel_listening(&mut self) {
        self.listen_generation += 1;
    }

    fn on_transcript(&mut self, text: &str) -> ControlFlow<()> {
        let actions = {
            let current = self.engine.current_config();
            let stats = StatsView::new(
                self.engine.last_snapshot(),
                self.engine.splits().last(),
                current.coach.distance_unit,
            );
            self.voice.on_transcript(text, &stats, Instant::now())
        };

        let mut flow = ControlFlow::Continue(());
        for action in actions {
            match action {
                VoiceAction::Speak(prompt) => {
                    self.engine.enqueue(prompt);
                }
                VoiceAction::Command(command) => {
                    self.services.control.apply(command);
                    if self.apply_command(command).is_break() {
                        flow = ControlFlow::Break(());
                    }
                }
                VoiceAction::RecordFeeling {
                    sentiment,
                    transcript,
                    question,
                } => self.record_feeling(sentiment, transcript, question),
            }
        }
        self.dispatch();
        flow
    }

    fn apply_command(&mut self, command: SessionCommand) -> ControlFlow<()> {
        match command {
            SessionCommand::Pause => self.pause(),
            SessionCommand::Resume => self.engine.resume(),
            SessionCommand::Stop => return self.stop(),
            SessionCommand::Mute => self.engine.set_muted(true),
            SessionCommand::Unmute => self.engine.set_muted(false),
        }
        ControlFlow::Continue(())
    }

    fn record_feeling(
        &self,
        sentiment: Sentiment,
        transcript: String,
        question: Option<QuestionCategory>,
    ) {
        let snapshot = self.engine.last_snapshot();
        let entry = FeelingEntry {
            recorded_at: Utc::now(),
            elapsed_secs: snapshot.elapsed_secs,
            distance_meters: snapshot.distance_meters,
            sentiment,
            transcript,
            question,
        };

        let journal = Arc::clone(&self.services.journal);
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || journal.record(&entry)).await {
                Ok(Ok(())) => log::debug!("session: feeling recorded"),
                Ok(Err(e)) => log::warn!("session: could not record feeling: {e}"),
                Err(e) => log::warn!("session: journal task failed: {e}"),
            }
        });
    }

    // -----------------------------------------------------------------------
    // Speech
    // -----------------------------------------------------------------------

    fn dispatch(&mut self) {
        if let Some(dispatch) = self.engine.dispatch() {
            self.on_dispatched(dispatch);
        }
    }

    fn on_dispatched(&mut self, dispatch: Dispatch) {
        let Dispatch {
            prompt,
            utterance_id,
            completion,
            ..
        } = dispatch;

        if prompt.category == PromptCategory::CheckIn {
            self.voice.on_check_in_asked(Instant::now());
        }
        if let Ok(mut st) = self.status.lock() {
            st.last_spoken = Some(prompt.message);
        }

        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = completion.wait().await;
            let _ = tx.send(SessionEvent::SpeechDone {
                utterance_id,
                outcome,
            });
        });
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn publish_status(&self) {
        let faulted: Vec<String> = self
            .engine
            .triggers()
            .iter()
            .filter(|t| t.faulted)
            .map(|t| t.tag().label().to_string())
            .collect();

        let Ok(mut st) = self.status.lock() else {
            return;
        };
        st.phase = self.engine.phase();
        st.voice = self.voice.state();
        st.muted = self.engine.is_muted();
        st.queue_len = self.engine.queue().len();
        st.faulted_triggers = faulted;
        st.elapsed_secs = self.engine.last_snapshot().elapsed_secs;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
