//! Configuration module for the running coach.
//!
//! Provides [`CoachConfig`] (top-level settings), the user-facing
//! [`CoachSettings`], athlete / engine / voice sub-configs, [`AppPaths`] for
//! the settings and journal files, and TOML persistence via `CoachConfig::load` /
//! `CoachConfig::save`.
//!
//! The live configuration is shared as [`SharedConfig`]; the tick loop reads
//! it on every tick so a change made from a settings screen mid-run takes
//! effect on the next tick.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    new_shared_config, read_config, update_config, AthleteProfile, CoachConfig, CoachSettings,
    EngineConfig, PaceAlertSettings, SharedConfig, SplitAnnouncement, VoiceConfig,
    ZoneAlertSettings,
};
