//! The coaching engine: evaluates triggers once per tick and feeds the speech
//! output from the prompt queue.
//!
//! # Tick flow
//!
//! ```text
//! tick(snapshot)
//!   ├─ sync live config (enabled flags, cooldowns, queue size, split unit)
//!   ├─ derive zone from heart rate when missing
//!   ├─ running and not paused?
//!   │    ├─ feed split tracker
//!   │    └─ for each active trigger, priority order:
//!   │         observe → cooldown? → should_fire → generate_prompt → enqueue
//!   └─ dispatch: idle → speak head
//!               busy + critical head + non-critical in flight → interrupt, speak head
//! ```
//!
//! The engine is synchronous and owned by the session loop. It never awaits
//! the speech output; completions come back through
//! [`on_speech_outcome`](CoachEngine::on_speech_outcome).

use std::sync::Arc;

use crate::config::{read_config, CoachConfig, SharedConfig};
use crate::prompt::{EnqueueOutcome, Priority, PromptCategory, PromptQueue, PromptSource, QueuedPrompt};
use crate::run::{RunStateSnapshot, Split, SplitTracker};
use crate::session::SessionPhase;
use crate::speech::{SpeechCompletion, SpeechOutcome, SpeechOutput, Utterance};
use crate::triggers::{EvalContext, TriggerId, TriggerSet, TriggerTag};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A trigger that fired during a tick and what the queue did with its prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTrigger {
    pub id: TriggerId,
    pub tag: TriggerTag,
    pub outcome: EnqueueOutcome,
}

/// A prompt handed to the speech output.
#[derive(Debug)]
pub struct Dispatch {
    pub prompt: QueuedPrompt,
    /// Identifies the utterance in [`CoachEngine::on_speech_outcome`].
    pub utterance_id: u64,
    pub completion: SpeechCompletion,
    /// A non-critical utterance was cut off to make room.
    pub interrupted: bool,
}

/// What happened during one [`CoachEngine::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    pub fired: Vec<FiredTrigger>,
    pub new_splits: Vec<Split>,
    pub dispatched: Option<Dispatch>,
    /// Triggers disabled by an error during this tick.
    pub faulted: Vec<TriggerId>,
}

impl TickReport {
    pub fn interrupted(&self) -> bool {
        self.dispatched.as_ref().is_some_and(|d| d.interrupted)
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: u64,
    priority: Priority,
    category: PromptCategory,
}

// ---------------------------------------------------------------------------
// CoachEngine
// ---------------------------------------------------------------------------

pub struct CoachEngine {
    config: SharedConfig,
    /// Copy of the live config taken at the last sync.
    current: CoachConfig,
    speech: Arc<dyn SpeechOutput>,
    triggers: TriggerSet,
    queue: PromptQueue,
    splits: SplitTracker,
    phase: SessionPhase,
    muted: bool,
    in_flight: Option<InFlight>,
    next_utterance: u64,
    next_announcement: u64,
    last_snapshot: RunStateSnapshot,
}

impl CoachEngine {
    pub fn new(config: SharedConfig, speech: Arc<dyn SpeechOutput>) -> Self {
        let current = read_config(&config);
        Self {
            triggers: TriggerSet::from_config(&current),
            queue: PromptQueue::new(current.engine.queue_capacity),
            splits: SplitTracker::new(current.coach.distance_unit),
            config,
            current,
            speech,
            phase: SessionPhase::NotStarted,
            muted: false,
            in_flight: None,
            next_utterance: 0,
            next_announcement: 0,
            last_snapshot: RunStateSnapshot::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn queue(&self) -> &PromptQueue {
        &self.queue
    }

    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    pub fn splits(&self) -> &[Split] {
        self.splits.splits()
    }

    /// The latest snapshot, with its zone filled in.
    pub fn last_snapshot(&self) -> &RunStateSnapshot {
        &self.last_snapshot
    }

    /// Config as of the last sync.
    pub fn current_config(&self) -> &CoachConfig {
        &self.current
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin a new session: fresh triggers, splits and queue.
    pub fn start(&mut self) {
        self.current = read_config(&self.config);
        self.triggers = TriggerSet::from_config(&self.current);
        self.queue = PromptQueue::new(self.current.engine.queue_capacity);
        self.splits.reset(self.current.coach.distance_unit);
        self.last_snapshot = RunStateSnapshot::default();
        self.muted = false;
        self.phase = SessionPhase::Running;
        log::info!("engine: session started with {} triggers", self.triggers.len());
    }

    /// Stop evaluating and drop every pending non-critical prompt.
    pub fn pause(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.phase = SessionPhase::Paused;
        let flushed = self.queue.retain_critical();
        log::info!("engine: paused, flushed {flushed} prompt(s)");
    }

    pub fn resume(&mut self) {
        if self.phase == SessionPhase::Paused {
            self.phase = SessionPhase::Running;
            log::info!("engine: resumed");
        }
    }

    /// End the session and drop everything pending.
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Stopped {
            return;
        }
        self.phase = SessionPhase::Stopped;
        let flushed = self.queue.clear();
        log::info!("engine: stopped, flushed {flushed} prompt(s)");
    }

    /// Muting flushes non-critical prompts, cuts off a non-critical utterance
    /// and suppresses new ones until unmuted. Triggers keep running.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        if muted {
            let flushed = self.queue.retain_critical();
            if self.in_flight.is_some_and(|f| !f.priority.is_critical()) {
                self.speech.interrupt();
            }
            log::info!("engine: muted, flushed {flushed} prompt(s)");
        } else {
            log::info!("engine: unmuted");
        }
    }

    // -----------------------------------------------------------------------
    // Queue access
    // -----------------------------------------------------------------------

    /// Offer a prompt to the queue.
    ///
    /// Non-critical prompts are suppressed unless the session is running,
    /// unmuted and enabled. Critical prompts are accepted while the session
    /// is running or paused.
    pub fn enqueue(&mut self, prompt: QueuedPrompt) -> EnqueueOutcome {
        let open = if prompt.priority.is_critical() {
            self.phase.is_active()
        } else {
            self.phase == SessionPhase::Running && !self.muted && self.current.coach.enabled
        };
        if !open {
            log::debug!(
                "engine: suppressed {} prompt \"{}\"",
                prompt.priority.label(),
                prompt.message
            );
            return EnqueueOutcome::Suppressed;
        }

        let outcome = self.queue.enqueue(prompt);
        match &outcome {
            EnqueueOutcome::AdmittedWithEviction(old) => {
                log::debug!("engine: evicted \"{}\" for a higher-priority prompt", old.message)
            }
            EnqueueOutcome::Dropped => log::debug!("engine: queue full, prompt dropped"),
            EnqueueOutcome::Duplicate => log::debug!("engine: duplicate prompt ignored"),
            EnqueueOutcome::Admitted | EnqueueOutcome::Suppressed => {}
        }
        outcome
    }

    /// Queue a host announcement (e.g. a safety message at `Critical`).
    pub fn announce(&mut self, text: impl Into<String>, priority: Priority) -> EnqueueOutcome {
        self.next_announcement += 1;
        let prompt = QueuedPrompt::new(
            text,
            priority,
            self.last_snapshot.elapsed_secs,
            PromptSource::Announcement(self.next_announcement),
            PromptCategory::Announcement,
        );
        self.enqueue(prompt)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one evaluation step against `snapshot`.
    pub fn tick(&mut self, snapshot: RunStateSnapshot) -> TickReport {
        let mut report = TickReport::default();
        self.sync_config();

        if !self.phase.is_active() {
            return report;
        }

        let mut snapshot = snapshot;
        if snapshot.current_zone.is_none() {
            snapshot.current_zone = self.current.athlete.zone_for(snapshot.current_heart_rate);
        }
        self.last_snapshot = snapshot;

        let evaluating = self.phase == SessionPhase::Running
            && !self.last_snapshot.is_paused
            && self.current.coach.enabled;
        if evaluating {
            self.evaluate(&mut report);
        }

        report.dispatched = self.dispatch();
        report
    }

    fn sync_config(&mut self) {
        let config = read_config(&self.config);
        if config == self.current {
            return;
        }

        self.triggers.apply_config(&config);
        for evicted in self.queue.set_capacity(config.engine.queue_capacity) {
            log::debug!("engine: queue shrunk, dropped \"{}\"", evicted.message);
        }
        self.splits.set_unit(config.coach.distance_unit);
        if !config.coach.enabled {
            self.queue.retain_critical();
        }
        self.current = config;
    }

    fn evaluate(&mut self, report: &mut TickReport) {
        let snapshot = &self.last_snapshot;
        let now = snapshot.elapsed_secs;
        report.new_splits = self
            .splits
            .observe(snapshot.elapsed_secs, snapshot.distance_meters)
            .to_vec();

        let ctx = EvalContext {
            snapshot,
            new_splits: &report.new_splits,
            splits: self.splits.splits(),
            unit: self.splits.unit(),
        };

        let mut prompts = Vec::new();
        for id in self.triggers.evaluation_order() {
            let Some(trigger) = self.triggers.get_mut(id) else {
                continue;
            };
            if !trigger.is_active() {
                continue;
            }

            match trigger.evaluate(&ctx, now) {
                Ok(Some(message)) => {
                    log::debug!("engine: {} fired at {now:.0}s", trigger.tag().label());
                    prompts.push((
                        id,
                        trigger.tag(),
                        QueuedPrompt::new(
                            message,
                            trigger.priority,
                            now,
                            PromptSource::Trigger(id),
                            trigger.kind.category(),
                        ),
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!(
                        "engine: {} trigger disabled for this session: {e}",
                        trigger.tag().label()
                    );
                    trigger.faulted = true;
                    report.faulted.push(id);
                }
            }
        }

        for (id, tag, prompt) in prompts {
            let outcome = self.enqueue(prompt);
            report.fired.push(FiredTrigger { id, tag, outcome });
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Hand the head of the queue to the speech output if it may play now.
    ///
    /// Called at the end of every tick; the session also calls it right after
    /// an utterance ends or a voice reply is queued.
    pub fn dispatch(&mut self) -> Option<Dispatch> {
        let head_priority = self.queue.peek()?.priority;

        let mut interrupted = false;
        if self.speech.is_busy() {
            let preempt = head_priority.is_critical()
                && self.in_flight.is_some_and(|f| !f.priority.is_critical());
            if !preempt {
                return None;
            }
            self.speech.interrupt();
            self.in_flight = None;
            interrupted = true;
            log::info!("engine: interrupting utterance for a critical prompt");
        }

        let prompt = self.queue.dequeue()?;
        match self.speech.speak(Utterance::from_prompt(&prompt, &self.current.coach)) {
            Ok(completion) => {
                self.next_utterance += 1;
                let utterance_id = self.next_utterance;
                self.in_flight = Some(InFlight {
                    id: utterance_id,
                    priority: prompt.priority,
                    category: prompt.category,
                });
                Some(Dispatch {
                    prompt,
                    utterance_id,
                    completion,
                    interrupted,
                })
            }
            Err(e) => {
                log::warn!("engine: speech output rejected \"{}\": {e}", prompt.message);
                None
            }
        }
    }

    /// Record how utterance `utterance_id` ended.
    ///
    /// Returns the prompt category when it was the utterance in flight.
    pub fn on_speech_outcome(
        &mut self,
        utterance_id: u64,
        outcome: &SpeechOutcome,
    ) -> Option<PromptCategory> {
        if let SpeechOutcome::Failed(reason) = outcome {
            log::warn!("engine: utterance {utterance_id} failed: {reason}");
        }
        match self.in_flight {
            Some(f) if f.id == utterance_id => {
                self.in_flight = None;
                Some(f.category)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{new_shared_config, update_config};
    use crate::run::Zone;
    use crate::speech::MockSpeechOutput;

    fn engine_with(config: CoachConfig) -> (CoachEngine, Arc<MockSpeechOutput>, SharedConfig) {
        let shared = new_shared_config(config);
        let speech = Arc::new(MockSpeechOutput::new());
        let engine = CoachEngine::new(Arc::clone(&shared), speech.clone());
        (engine, speech, shared)
    }

    /// Only the trigger under test stays on.
    fn quiet_config() -> CoachConfig {
        let mut cfg = CoachConfig::default();
        cfg.coach.pace_alerts.enabled = false;
        cfg.coach.zone_alerts.enabled = false;
        cfg.coach.check_in_interval_secs = 0;
        cfg
    }

    /// Let the in-flight utterance finish and tell the engine.
    fn finish(engine: &mut CoachEngine, speech: &MockSpeechOutput, dispatch: &Dispatch) {
        speech.finish();
        engine.on_speech_outcome(dispatch.utterance_id, &SpeechOutcome::Finished);
    }

    #[test]
    fn split_at_one_kilometer_is_announced_once() {
        let (mut engine, speech, _) = engine_with(CoachConfig::default());
        engine.start();

        let mut split_ticks = Vec::new();
        for t in 0..=360 {
            let secs = t as f64;
            let snap = RunStateSnapshot::new(secs, secs * 1_000.0 / 300.0).with_pace(300.0, 300.0);
            let report = engine.tick(snap);
            if report.fired.iter().any(|f| f.tag == TriggerTag::Split) {
                split_ticks.push(t);
            }
            if let Some(d) = report.dispatched {
                finish(&mut engine, &speech, &d);
            }
        }

        assert_eq!(split_ticks, [300]);
        assert_eq!(speech.spoken_texts(), ["Kilometer 1 in 5:00 per kilometer."]);
        let split = engine.triggers().find(TriggerTag::Split).and_then(|id| engine.triggers().get(id));
        assert_eq!(split.and_then(|t| t.last_fired_at), Some(300.0));
    }

    #[test]
    fn zone_duration_fires_once_for_a_long_streak() {
        let mut cfg = quiet_config();
        cfg.coach.zone_alerts.enabled = true;
        cfg.coach.zone_alerts.zones.clear();
        let (mut engine, speech, _) = engine_with(cfg);
        engine.start();

        let mut fired = Vec::new();
        for t in 0..=400 {
            let zone = if (100..=300).contains(&t) { Zone::MAXIMUM } else { Zone::ENDURANCE };
            let snap = RunStateSnapshot::new(t as f64, t as f64 * 3.0).with_zone(zone);
            let report = engine.tick(snap);
            fired.extend(report.fired.iter().filter(|f| f.tag == TriggerTag::ZoneDuration).map(|_| t));
            if let Some(d) = report.dispatched {
                finish(&mut engine, &speech, &d);
            }
        }

        assert_eq!(fired, [280]);
    }

    #[test]
    fn zone_is_derived_from_heart_rate() {
        let mut cfg = quiet_config();
        cfg.coach.zone_alerts.enabled = true;
        let (mut engine, speech, _) = engine_with(cfg);
        engine.start();

        let report = engine.tick(RunStateSnapshot::new(10.0, 30.0).with_heart_rate(180));
        assert_eq!(engine.last_snapshot().current_zone, Some(Zone::MAXIMUM));
        assert!(report.dispatched.is_some());
        assert_eq!(speech.spoken_texts(), ["Entering zone 5, maximum."]);
    }

    #[test]
    fn cooldown_holds_in_run_time_across_pause() {
        let mut cfg = quiet_config();
        cfg.coach.zone_alerts.enabled = true;
        cfg.coach.zone_alerts.zones = [Zone::THRESHOLD, Zone::MAXIMUM].into_iter().collect();
        cfg.engine.zone_duration_threshold_secs = 10_000.0;
        let (mut engine, speech, _) = engine_with(cfg);
        engine.start();

        let mut fired_at = Vec::new();
        let mut run_time = 0.0;
        for tick in 0..400 {
            // 100 wall ticks of pause in the middle; run time frozen.
            let paused = (150..250).contains(&tick);
            if !paused {
                run_time += 1.0;
            }
            let zone = if tick % 2 == 0 { Zone::THRESHOLD } else { Zone::MAXIMUM };
            let mut snap = RunStateSnapshot::new(run_time, run_time * 3.0).with_zone(zone);
            snap.is_paused = paused;

            let report = engine.tick(snap);
            if !report.fired.is_empty() {
                fired_at.push(run_time);
            }
            if let Some(d) = report.dispatched {
                finish(&mut engine, &speech, &d);
            }
        }

        assert!(!fired_at.is_empty());
        for pair in fired_at.windows(2) {
            assert!(pair[1] - pair[0] >= 60.0, "fired at {pair:?}");
        }
    }

    #[test]
    fn pause_flushes_and_blocks_non_critical() {
        let (mut engine, speech, _) = engine_with(quiet_config());
        engine.start();
        engine.announce("one", Priority::Medium);
        assert!(engine.dispatch().is_some());
        engine.announce("two", Priority::Low);
        engine.announce("safety", Priority::Critical);
        assert_eq!(engine.queue().len(), 2);

        engine.pause();
        assert_eq!(engine.queue().len(), 1);
        assert_eq!(engine.queue().peek().map(|p| p.priority), Some(Priority::Critical));
        assert_eq!(engine.announce("three", Priority::High), EnqueueOutcome::Suppressed);
        assert!(engine.announce("heat warning", Priority::Critical).is_admitted());

        engine.resume();
        assert!(engine.announce("four", Priority::Low).is_admitted());
        assert_eq!(speech.spoken_texts()[0], "one");
    }

    #[test]
    fn critical_interrupts_non_critical_only() {
        let (mut engine, speech, _) = engine_with(quiet_config());
        engine.start();

        engine.announce("split info", Priority::Medium);
        let first = engine.dispatch().expect("first dispatch");
        assert!(!first.interrupted);

        engine.announce("car ahead", Priority::Critical);
        let second = engine.dispatch().expect("critical dispatch");
        assert!(second.interrupted);
        assert_eq!(speech.interrupts(), 1);

        // A critical prompt never cuts off another critical one.
        engine.announce("another warning", Priority::Critical);
        assert!(engine.dispatch().is_none());
        assert_eq!(engine.queue().len(), 1);

        // The interrupted utterance's late outcome does not clear the new one.
        assert_eq!(engine.on_speech_outcome(first.utterance_id, &SpeechOutcome::Interrupted), None);
        assert_eq!(
            engine.on_speech_outcome(second.utterance_id, &SpeechOutcome::Finished),
            Some(PromptCategory::Announcement)
        );
        assert_eq!(speech.spoken_texts(), ["split info", "car ahead"]);
    }

    #[test]
    fn pending_voice_clarification_does_not_block_a_later_stats_reply() {
        let (mut engine, speech, _) = engine_with(quiet_config());
        engine.start();

        engine.announce("split info", Priority::Medium);
        let first = engine.dispatch().expect("first dispatch");

        let clarification = QueuedPrompt::new(
            "Sorry, I didn't catch that.",
            Priority::Low,
            10.0,
            PromptSource::Voice(1),
            PromptCategory::Clarification,
        );
        let reply = QueuedPrompt::new(
            "Heart rate 150.",
            Priority::High,
            12.0,
            PromptSource::Voice(2),
            PromptCategory::StatsReply,
        );
        assert!(engine.enqueue(clarification).is_admitted());
        assert!(engine.enqueue(reply).is_admitted());
        assert!(engine.dispatch().is_none());

        finish(&mut engine, &speech, &first);
        let next = engine.dispatch().expect("stats reply dispatch");
        assert_eq!(next.prompt.category, PromptCategory::StatsReply);
        assert_eq!(engine.queue().len(), 1);
    }

    #[test]
    fn speak_failure_drops_prompt() {
        let shared = new_shared_config(quiet_config());
        let mut engine = CoachEngine::new(shared, Arc::new(MockSpeechOutput::failing()));
        engine.start();
        engine.announce("hello", Priority::High);

        let report = engine.tick(RunStateSnapshot::new(1.0, 3.0));
        assert!(report.dispatched.is_none());
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn faulted_trigger_is_disabled_and_others_keep_running() {
        let mut cfg = CoachConfig::default();
        cfg.engine.pace_warmup_secs = 0.0;
        cfg.coach.check_in_interval_secs = 5;
        let (mut engine, speech, _) = engine_with(cfg);
        engine.start();

        let bad = RunStateSnapshot::new(1.0, 3.0).with_pace(f64::NAN, 300.0);
        let report = engine.tick(bad);
        let pace_id = engine.triggers().find(TriggerTag::PaceDrift).expect("pace trigger");
        assert_eq!(report.faulted, [pace_id]);

        let mut check_ins = 0;
        for t in 2..=12 {
            let report = engine.tick(RunStateSnapshot::new(t as f64, t as f64 * 3.0).with_pace(f64::NAN, 300.0));
            assert!(report.faulted.is_empty());
            check_ins += report.fired.iter().filter(|f| f.tag == TriggerTag::CheckIn).count();
            if let Some(d) = report.dispatched {
                finish(&mut engine, &speech, &d);
            }
        }
        assert_eq!(check_ins, 2);
        assert_eq!(engine.triggers().faulted(), [pace_id]);
    }

    #[test]
    fn muted_triggers_fire_but_stay_silent() {
        let mut cfg = quiet_config();
        cfg.coach.check_in_interval_secs = 10;
        let (mut engine, speech, _) = engine_with(cfg);
        engine.start();
        engine.set_muted(true);

        let report = engine.tick(RunStateSnapshot::new(10.0, 30.0));
        assert_eq!(report.fired.len(), 1);
        assert_eq!(report.fired[0].outcome, EnqueueOutcome::Suppressed);
        assert!(speech.spoken_texts().is_empty());

        engine.set_muted(false);
        assert!(engine.tick(RunStateSnapshot::new(15.0, 45.0)).fired.is_empty());
    }

    #[test]
    fn settings_change_applies_on_next_tick() {
        let mut cfg = quiet_config();
        cfg.coach.check_in_interval_secs = 10;
        let (mut engine, _speech, shared) = engine_with(cfg);
        engine.start();

        update_config(&shared, |c| c.coach.enabled = false);
        let report = engine.tick(RunStateSnapshot::new(20.0, 60.0));
        assert!(report.fired.is_empty());
        assert!(report.dispatched.is_none());

        update_config(&shared, |c| c.coach.enabled = true);
        let report = engine.tick(RunStateSnapshot::new(21.0, 63.0));
        assert_eq!(report.fired.len(), 1);
    }

    #[test]
    fn nothing_happens_before_start_or_after_stop() {
        let mut cfg = quiet_config();
        cfg.coach.check_in_interval_secs = 1;
        let (mut engine, _speech, _) = engine_with(cfg);

        assert!(engine.tick(RunStateSnapshot::new(5.0, 15.0)).fired.is_empty());
        assert_eq!(engine.announce("hi", Priority::Critical), EnqueueOutcome::Suppressed);

        engine.start();
        engine.stop();
        assert!(engine.tick(RunStateSnapshot::new(6.0, 18.0)).fired.is_empty());
        assert_eq!(engine.phase(), SessionPhase::Stopped);
    }
}
