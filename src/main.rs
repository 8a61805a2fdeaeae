//! Demo entry point: coaches a simulated run on the console.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`CoachConfig`] from disk (default on first run or on error).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the services: synthetic run data, log-backed speech, a scripted
//!    recognizer and the JSON-lines feeling journal.
//! 5. Spawn [`CoachSession::run`] and drive it through a [`CoachHandle`] the
//!    way a host app would.
//!
//! Run time is compressed by [`SPEEDUP`], so a twenty-minute run takes about
//! twenty seconds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use runaway_coach::config::{new_shared_config, AppPaths, CoachConfig};
use runaway_coach::prompt::Priority;
use runaway_coach::run::{RunStateProvider, RunStateSnapshot};
use runaway_coach::session::{
    coach_channel, new_shared_status, CoachServices, CoachSession, JsonlFeelingJournal,
    LoggingControl, SharedStatus,
};
use runaway_coach::speech::{ConsoleSpeech, ScriptedRecognizer, ScriptedReply};

/// Seconds of run time per wall-clock second.
const SPEEDUP: f64 = 60.0;

// ---------------------------------------------------------------------------
// Synthetic run
// ---------------------------------------------------------------------------

/// Steady 5:00/km for 15 minutes, then a fade to 5:45/km, with heart rate
/// climbing from 120 bpm.
struct SyntheticRun {
    started: Instant,
    speedup: f64,
}

impl SyntheticRun {
    const STEADY_SECS: f64 = 900.0;
    const STEADY_PACE: f64 = 300.0;
    const FADE_PACE: f64 = 345.0;

    fn new(speedup: f64) -> Self {
        Self {
            started: Instant::now(),
            speedup,
        }
    }
}

impl RunStateProvider for SyntheticRun {
    fn snapshot(&self) -> RunStateSnapshot {
        let elapsed = self.started.elapsed().as_secs_f64() * self.speedup;

        let (pace, distance) = if elapsed < Self::STEADY_SECS {
            (Self::STEADY_PACE, elapsed * 1_000.0 / Self::STEADY_PACE)
        } else {
            let steady = Self::STEADY_SECS * 1_000.0 / Self::STEADY_PACE;
            let fade = (elapsed - Self::STEADY_SECS) * 1_000.0 / Self::FADE_PACE;
            (Self::FADE_PACE, steady + fade)
        };
        let average = if distance > 0.0 {
            elapsed * 1_000.0 / distance
        } else {
            0.0
        };
        let heart_rate = (120.0 + elapsed / 15.0).min(186.0) as u16;

        RunStateSnapshot::new(elapsed, distance)
            .with_pace(pace, average)
            .with_heart_rate(heart_rate)
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("runaway-coach demo starting up");

    // 2. Configuration
    let config = CoachConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        CoachConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    rt.block_on(run_demo(config, AppPaths::new()));
    Ok(())
}

async fn run_demo(config: CoachConfig, paths: AppPaths) {
    // 4. Services
    let journal = JsonlFeelingJournal::new(paths.journal_file);
    log::info!("feeling journal: {}", journal.path().display());

    let recognizer = ScriptedRecognizer::new([
        ScriptedReply::Say("what's my heart rate".into()),
        ScriptedReply::Say("feeling strong".into()),
    ]);

    let services = CoachServices {
        provider: Arc::new(SyntheticRun::new(SPEEDUP)),
        speech: Arc::new(ConsoleSpeech::default()),
        recognizer: Arc::new(recognizer),
        control: Arc::new(LoggingControl),
        journal: Arc::new(journal),
    };

    // 5. Session
    let settings = config.coach.clone();
    let status = new_shared_status();
    let session = CoachSession::new(new_shared_config(config), Arc::clone(&status), services);
    let (handle, rx) = coach_channel();
    let task = tokio::spawn(session.run(rx));

    handle.on_session_start(settings);

    // The runner taps the voice button five minutes in.
    sleep_run_secs(300.0).await;
    handle.activate_voice();

    // A safety message from the host at the thirteen-minute mark.
    sleep_run_secs(480.0).await;
    handle.announce("Road crossing ahead. Look both ways.", Priority::Critical);

    sleep_run_secs(360.0).await;
    handle.on_session_stop();

    if let Err(e) = task.await {
        log::error!("coach task failed: {e}");
    }
    log_status(&status);
}

async fn sleep_run_secs(run_secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(run_secs / SPEEDUP)).await;
}

fn log_status(status: &SharedStatus) {
    let Ok(st) = status.lock() else {
        return;
    };
    log::info!(
        "final status: {} at {:.0}s, last spoken {:?}, faulted {:?}",
        st.phase.label(),
        st.elapsed_secs,
        st.last_spoken,
        st.faulted_triggers
    );
}
