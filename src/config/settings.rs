//! Coach settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::run::{zone_for, DistanceUnit, Zone};

// ---------------------------------------------------------------------------
// SplitAnnouncement
// ---------------------------------------------------------------------------

/// How much detail a split announcement carries.
///
/// | Variant  | Spoken                                                   |
/// |----------|----------------------------------------------------------|
/// | Off      | nothing                                                  |
/// | Basic    | split number and split pace                              |
/// | Detailed | basic + total time, average pace, delta vs. last split   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitAnnouncement {
    Off,
    Basic,
    Detailed,
}

impl Default for SplitAnnouncement {
    fn default() -> Self {
        Self::Basic
    }
}

// ---------------------------------------------------------------------------
// PaceAlertSettings
// ---------------------------------------------------------------------------

/// Pace-drift alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceAlertSettings {
    pub enabled: bool,
    /// Relative drift from the reference pace that triggers an alert
    /// (`0.10` = 10 %).
    pub drift_threshold: f64,
}

impl Default for PaceAlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            drift_threshold: 0.10,
        }
    }
}

// ---------------------------------------------------------------------------
// ZoneAlertSettings
// ---------------------------------------------------------------------------

/// Heart-rate zone alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAlertSettings {
    pub enabled: bool,
    /// Zones whose entry is announced.
    pub zones: BTreeSet<Zone>,
}

impl Default for ZoneAlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            zones: [Zone::THRESHOLD, Zone::MAXIMUM].into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// CoachSettings
// ---------------------------------------------------------------------------

/// The options a runner can change from the settings screen, including in
/// the middle of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachSettings {
    /// Master switch for all coaching prompts.
    pub enabled: bool,
    pub announce_splits: SplitAnnouncement,
    /// Unit used for split boundaries and for every spoken distance / pace.
    pub distance_unit: DistanceUnit,
    /// Seconds of run time between check-in questions. `0` disables them.
    pub check_in_interval_secs: u64,
    /// Speech synthesis rate multiplier (`1.0` = normal).
    pub speech_rate: f32,
    /// Platform voice identifier; `None` uses the system default voice.
    pub voice_identifier: Option<String>,
    /// Open the microphone automatically after a check-in question.
    pub auto_listen: bool,
    // Tables last so TOML output stays valid.
    pub pace_alerts: PaceAlertSettings,
    pub zone_alerts: ZoneAlertSettings,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            announce_splits: SplitAnnouncement::default(),
            distance_unit: DistanceUnit::default(),
            check_in_interval_secs: 600,
            speech_rate: 1.0,
            voice_identifier: None,
            auto_listen: true,
            pace_alerts: PaceAlertSettings::default(),
            zone_alerts: ZoneAlertSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// AthleteProfile
// ---------------------------------------------------------------------------

/// Heart-rate profile used to derive zones from raw heart rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub max_heart_rate: u16,
    pub resting_heart_rate: u16,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            max_heart_rate: 190,
            resting_heart_rate: 60,
        }
    }
}

impl AthleteProfile {
    /// Zone for `heart_rate` under this profile.
    ///
    /// ```
    /// use runaway_coach::config::AthleteProfile;
    /// use runaway_coach::run::Zone;
    ///
    /// let athlete = AthleteProfile::default(); // 190 max, 60 resting
    /// assert_eq!(athlete.zone_for(Some(180)), Some(Zone::MAXIMUM));
    /// assert_eq!(athlete.zone_for(None), None);
    /// ```
    pub fn zone_for(&self, heart_rate: Option<u16>) -> Option<Zone> {
        zone_for(heart_rate, self.max_heart_rate, self.resting_heart_rate)
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Scheduler tuning: tick rate, queue size and per-trigger defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the evaluation loop in milliseconds.
    pub tick_interval_ms: u64,
    /// Maximum number of prompts waiting to be spoken.
    pub queue_capacity: usize,
    pub split_cooldown_secs: f64,
    pub pace_drift_cooldown_secs: f64,
    /// Run time before pace-drift alerts may fire (pace is noisy at the start).
    pub pace_warmup_secs: f64,
    pub zone_transition_cooldown_secs: f64,
    pub zone_duration_cooldown_secs: f64,
    /// Consecutive run time in a high zone before the duration alert fires.
    pub zone_duration_threshold_secs: f64,
    /// Lowest zone that counts towards the duration alert.
    pub zone_duration_min_zone: Zone,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            queue_capacity: 3,
            split_cooldown_secs: 30.0,
            pace_drift_cooldown_secs: 120.0,
            pace_warmup_secs: 120.0,
            zone_transition_cooldown_secs: 60.0,
            zone_duration_cooldown_secs: 60.0,
            zone_duration_threshold_secs: 180.0,
            zone_duration_min_zone: Zone::THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceConfig
// ---------------------------------------------------------------------------

/// Turn-taking timeouts for the voice coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Maximum time the microphone stays open waiting for a final transcript.
    pub listen_timeout_secs: u64,
    /// Silence after which the conversation context is forgotten.
    pub context_silence_secs: u64,
    /// How long after answering a check-in a follow-up feeling still counts.
    pub feeling_grace_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            listen_timeout_secs: 8,
            context_silence_secs: 120,
            feeling_grace_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// CoachConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use runaway_coach::config::CoachConfig;
///
/// // Load (returns Default when file is missing)
/// let config = CoachConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// User-facing coaching options.
    pub coach: CoachSettings,
    /// Heart-rate profile.
    pub athlete: AthleteProfile,
    /// Scheduler tuning.
    pub engine: EngineConfig,
    /// Voice turn-taking timeouts.
    pub voice: VoiceConfig,
}

impl CoachConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(CoachConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SharedConfig
// ---------------------------------------------------------------------------

/// Thread-safe handle to the live [`CoachConfig`].
///
/// Written by the settings screen, read by the tick loop on every tick.
pub type SharedConfig = Arc<RwLock<CoachConfig>>;

/// Construct a new [`SharedConfig`].
pub fn new_shared_config(config: CoachConfig) -> SharedConfig {
    Arc::new(RwLock::new(config))
}

/// Clone the current configuration out of `shared`.
///
/// A poisoned lock still holds a complete config, so it is read anyway.
pub fn read_config(shared: &SharedConfig) -> CoachConfig {
    match shared.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Apply `f` to the configuration held in `shared`.
pub fn update_config(shared: &SharedConfig, f: impl FnOnce(&mut CoachConfig)) {
    match shared.write() {
        Ok(mut guard) => f(&mut guard),
        Err(poisoned) => f(&mut poisoned.into_inner()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = CoachConfig::default();
        original.save_to(&path).expect("save");

        let loaded = CoachConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = CoachConfig::load_from(&path).expect("should not error");
        assert_eq!(config, CoachConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = CoachConfig::default();

        assert!(cfg.coach.enabled);
        assert_eq!(cfg.coach.announce_splits, SplitAnnouncement::Basic);
        assert_eq!(cfg.coach.distance_unit, DistanceUnit::Kilometers);
        assert_eq!(cfg.coach.check_in_interval_secs, 600);
        assert!(cfg.coach.voice_identifier.is_none());
        assert!(cfg.coach.zone_alerts.zones.contains(&Zone::MAXIMUM));
        assert_eq!(cfg.engine.queue_capacity, 3);
        assert_eq!(cfg.engine.tick_interval_ms, 1_000);
        assert_eq!(cfg.engine.zone_duration_min_zone, Zone::THRESHOLD);
        assert_eq!(cfg.voice.listen_timeout_secs, 8);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = CoachConfig::default();
        cfg.coach.announce_splits = SplitAnnouncement::Detailed;
        cfg.coach.distance_unit = DistanceUnit::Miles;
        cfg.coach.voice_identifier = Some("com.apple.voice.Samantha".into());
        cfg.coach.zone_alerts.zones = [Zone::TEMPO].into_iter().collect();
        cfg.athlete.max_heart_rate = 201;
        cfg.engine.queue_capacity = 5;

        cfg.save_to(&path).expect("save");
        let loaded = CoachConfig::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[coach]\ncheck_in_interval_secs = 0\n").unwrap();

        let loaded = CoachConfig::load_from(&path).expect("load");
        assert_eq!(loaded.coach.check_in_interval_secs, 0);
        assert_eq!(loaded.engine, EngineConfig::default());
        assert_eq!(loaded.coach.announce_splits, SplitAnnouncement::Basic);
    }

    #[test]
    fn out_of_range_zone_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad-zone.toml");
        std::fs::write(&path, "[engine]\nzone_duration_min_zone = 7\n").unwrap();

        assert!(CoachConfig::load_from(&path).is_err());
    }

    #[test]
    fn shared_config_updates_are_visible() {
        let shared = new_shared_config(CoachConfig::default());
        update_config(&shared, |c| c.coach.enabled = false);
        assert!(!read_config(&shared).coach.enabled);
    }
}
