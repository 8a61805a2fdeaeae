//! Voice turn-taking state machine.
//!
//! # Turn flow
//!
//! ```text
//! Idle ──activate──▶ Listening ──final transcript──▶ Parsing
//!                        │                              ├─▶ Acting ──────────────▶ Idle
//!                        │                              └─▶ AwaitingClarification ▶ Idle
//!                        └──timeout / recognition error──────────────────────────▶ Idle
//! any state ──force_idle──▶ Idle
//! ```
//!
//! The coordinator is synchronous: it never talks to the recognizer or the
//! speech output itself. It returns [`VoiceAction`]s and the session loop
//! carries them out.

use std::time::{Duration, Instant};

use crate::config::{CoachSettings, VoiceConfig};
use crate::prompt::{Priority, PromptCategory, PromptSource, QueuedPrompt};
use crate::run::{format_distance, format_duration, format_pace, DistanceUnit, RunStateSnapshot, Split};
use crate::session::SessionCommand;
use crate::voice::context::{ConversationContext, QuestionCategory};
use crate::voice::intent::{Intent, IntentParser, Sentiment, StatsMetric};

const CLARIFICATION: &str = "Sorry, I didn't catch that. Ask me for your pace or distance.";

// ---------------------------------------------------------------------------
// VoiceState / ActivationSource / VoiceAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Parsing,
    Acting,
    AwaitingClarification,
}

impl VoiceState {
    pub fn label(self) -> &'static str {
        match self {
            VoiceState::Idle => "Idle",
            VoiceState::Listening => "Listening",
            VoiceState::Parsing => "Parsing",
            VoiceState::Acting => "Acting",
            VoiceState::AwaitingClarification => "Awaiting clarification",
        }
    }
}

/// Why the microphone is being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationSource {
    /// Button or gesture.
    User,
    /// A check-in question just finished playing.
    AutoAfterCheckIn,
}

/// Work the session loop performs on behalf of the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceAction {
    /// Enqueue a reply.
    Speak(QueuedPrompt),
    /// Forward to session control and apply locally.
    Command(SessionCommand),
    /// Append to the feeling journal.
    RecordFeeling {
        sentiment: Sentiment,
        transcript: String,
        question: Option<QuestionCategory>,
    },
}

// ---------------------------------------------------------------------------
// StatsView
// ---------------------------------------------------------------------------

/// The run data a stats reply can draw on.
#[derive(Debug, Clone, Copy)]
pub struct StatsView<'a> {
    pub snapshot: &'a RunStateSnapshot,
    pub last_split: Option<&'a Split>,
    pub unit: DistanceUnit,
}

impl<'a> StatsView<'a> {
    pub fn new(snapshot: &'a RunStateSnapshot, last_split: Option<&'a Split>, unit: DistanceUnit) -> Self {
        Self {
            snapshot,
            last_split,
            unit,
        }
    }

    /// Spoken answer for `metric`.
    pub fn describe(&self, metric: StatsMetric) -> String {
        let snap = self.snapshot;
        let per = self.unit.singular();
        match metric {
            StatsMetric::CurrentPace => match format_pace(snap.current_pace_sec_per_km, self.unit) {
                Some(p) => format!("Current pace {p} per {per}."),
                None => "No pace reading yet.".to_string(),
            },
            StatsMetric::AveragePace => match format_pace(snap.average_pace_sec_per_km, self.unit) {
                Some(p) => format!("Average pace {p} per {per}."),
                None => "No average pace yet.".to_string(),
            },
            StatsMetric::Distance => {
                format!("You've covered {}.", format_distance(snap.distance_meters, self.unit))
            }
            StatsMetric::ElapsedTime => format!("Elapsed time {}.", format_duration(snap.elapsed_secs)),
            StatsMetric::HeartRate => match snap.current_heart_rate {
                Some(hr) => format!("Heart rate {hr}."),
                None => "No heart rate reading.".to_string(),
            },
            StatsMetric::Zone => match snap.current_zone {
                Some(z) => format!("You're in zone {}, {}.", z.number(), z.name()),
                None => "No heart rate zone available.".to_string(),
            },
            StatsMetric::LastSplit => match self.last_split {
                Some(split) => match format_pace(split.pace_sec_per_km, self.unit) {
                    Some(p) => format!("Split {} in {p} per {per}.", split.index),
                    None => format!("Split {} took {}.", split.index, format_duration(split.duration_secs)),
                },
                None => "No splits completed yet.".to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceCoordinator
// ---------------------------------------------------------------------------

/// Turn-taking between spoken prompts, the listening window and intents.
#[derive(Debug)]
pub struct VoiceCoordinator {
    state: VoiceState,
    context: ConversationContext,
    parser: IntentParser,
    auto_listen: bool,
    /// Parsed transcripts so far. Never reset, so replies from different
    /// turns never share a queue source.
    turns: u64,
}

impl VoiceCoordinator {
    pub fn new(voice: &VoiceConfig, settings: &CoachSettings) -> Self {
        Self {
            state: VoiceState::Idle,
            context: ConversationContext::new(
                Duration::from_secs(voice.context_silence_secs),
                Duration::from_secs(voice.feeling_grace_secs),
            ),
            parser: IntentParser::new(),
            auto_listen: settings.auto_listen,
            turns: 0,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Pick up changed windows and the auto-listen flag.
    pub fn apply_config(&mut self, voice: &VoiceConfig, settings: &CoachSettings) {
        self.context.set_windows(
            Duration::from_secs(voice.context_silence_secs),
            Duration::from_secs(voice.feeling_grace_secs),
        );
        self.auto_listen = settings.auto_listen;
    }

    /// Open a listening window. Returns `false` when not idle, or for an
    /// automatic activation while auto-listen is off.
    pub fn activate(&mut self, source: ActivationSource, now: Instant) -> bool {
        if self.state != VoiceState::Idle {
            log::debug!("voice: activation ignored in state {}", self.state.label());
            return false;
        }
        if source == ActivationSource::AutoAfterCheckIn && !self.auto_listen {
            return false;
        }
        self.context.expire_if_silent(now);
        self.transition(VoiceState::Listening);
        true
    }

    /// A check-in question was handed to the speech output.
    pub fn on_check_in_asked(&mut self, now: Instant) {
        self.context.arm_question(QuestionCategory::HowDoYouFeel, now);
    }

    /// Handle a final transcript. An empty transcript counts as a timeout.
    pub fn on_transcript(&mut self, text: &str, stats: &StatsView<'_>, now: Instant) -> Vec<VoiceAction> {
        if self.state != VoiceState::Listening {
            log::debug!("voice: transcript ignored in state {}", self.state.label());
            return Vec::new();
        }
        if text.trim().is_empty() {
            self.transition(VoiceState::Idle);
            return Vec::new();
        }

        self.transition(VoiceState::Parsing);
        self.context.expire_if_silent(now);
        let intent = self.parser.parse(text, self.context.expects_feeling(now));
        log::debug!("voice: \"{text}\" -> {intent:?}");
        self.context.record_turn(intent, now);
        self.turns += 1;

        let turn = self.turns;
        let created_at = stats.snapshot.elapsed_secs;
        let mut actions = Vec::new();
        match intent {
            Intent::Command { command } => {
                self.transition(VoiceState::Acting);
                actions.push(VoiceAction::Command(command));
                if let Some(reply) = confirmation(command) {
                    actions.push(VoiceAction::Speak(voice_prompt(
                        turn,
                        reply,
                        Priority::Low,
                        created_at,
                        PromptCategory::Confirmation,
                    )));
                }
            }
            Intent::StatsRequest { metric } => {
                self.transition(VoiceState::Acting);
                actions.push(VoiceAction::Speak(voice_prompt(
                    turn,
                    stats.describe(metric),
                    Priority::High,
                    created_at,
                    PromptCategory::StatsReply,
                )));
            }
            Intent::FeelingResponse { sentiment } => {
                self.transition(VoiceState::Acting);
                let question = self.context.answer_question(now);
                actions.push(VoiceAction::RecordFeeling {
                    sentiment,
                    transcript: text.trim().to_string(),
                    question,
                });
            }
            Intent::Unknown => {
                self.transition(VoiceState::AwaitingClarification);
                actions.push(VoiceAction::Speak(voice_prompt(
                    turn,
                    CLARIFICATION,
                    Priority::Low,
                    created_at,
                    PromptCategory::Clarification,
                )));
            }
        }

        self.transition(VoiceState::Idle);
        actions
    }

    pub fn on_listen_timeout(&mut self) {
        if self.state == VoiceState::Listening {
            log::debug!("voice: listening window timed out");
            self.transition(VoiceState::Idle);
        }
    }

    pub fn on_recognition_error(&mut self, reason: &str) {
        if self.state == VoiceState::Listening {
            log::warn!("voice: recognition failed: {reason}");
            self.transition(VoiceState::Idle);
        }
    }

    /// Abandon whatever turn is in progress (pause, stop).
    pub fn force_idle(&mut self) {
        if self.state != VoiceState::Idle {
            self.transition(VoiceState::Idle);
        }
    }

    /// Forget the conversation (new session).
    pub fn reset(&mut self) {
        self.force_idle();
        self.context.reset();
    }

    fn transition(&mut self, next: VoiceState) {
        log::debug!("voice: {} -> {}", self.state.label(), next.label());
        self.state = next;
    }
}

fn confirmation(command: SessionCommand) -> Option<&'static str> {
    match command {
        SessionCommand::Resume => Some("Resuming."),
        SessionCommand::Unmute => Some("Voice coaching back on."),
        SessionCommand::Pause | SessionCommand::Stop | SessionCommand::Mute => None,
    }
}

fn voice_prompt(
    turn: u64,
    message: impl Into<String>,
    priority: Priority,
    created_at_secs: f64,
    category: PromptCategory,
) -> QueuedPrompt {
    QueuedPrompt::new(message, priority, created_at_secs, PromptSource::Voice(turn), category)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
