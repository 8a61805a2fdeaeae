//! Closed set of trigger variants and the per-tick evaluation context.
//!
//! Every variant shares one contract:
//!
//! | Step              | When                                              |
//! |-------------------|---------------------------------------------------|
//! | `observe`         | every active tick, also during cooldown           |
//! | `should_fire`     | only once the cooldown has elapsed                |
//! | `generate_prompt` | when `should_fire` returned `true`                |
//! | `on_fired`        | after the prompt was produced                     |

use crate::config::CoachConfig;
use crate::prompt::{Priority, PromptCategory};
use crate::run::{DistanceUnit, RunStateSnapshot, Split};
use crate::triggers::check_in::CheckInTrigger;
use crate::triggers::pace::PaceDriftTrigger;
use crate::triggers::split::SplitTrigger;
use crate::triggers::trigger::TriggerError;
use crate::triggers::zone::{ZoneDurationTrigger, ZoneTransitionTrigger};

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

/// Read-only view handed to every trigger during one tick.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Snapshot with the zone already derived.
    pub snapshot: &'a RunStateSnapshot,
    /// Splits completed during this tick.
    pub new_splits: &'a [Split],
    /// Full split history, oldest first.
    pub splits: &'a [Split],
    pub unit: DistanceUnit,
}

/// Scheduling parameters a variant derives from the live config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerParams {
    pub enabled: bool,
    pub cooldown_secs: f64,
}

// ---------------------------------------------------------------------------
// TriggerTag
// ---------------------------------------------------------------------------

/// Field-less discriminant of [`TriggerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerTag {
    Split,
    PaceDrift,
    ZoneTransition,
    ZoneDuration,
    CheckIn,
}

impl TriggerTag {
    pub fn label(self) -> &'static str {
        match self {
            TriggerTag::Split => "split",
            TriggerTag::PaceDrift => "pace-drift",
            TriggerTag::ZoneTransition => "zone-transition",
            TriggerTag::ZoneDuration => "zone-duration",
            TriggerTag::CheckIn => "check-in",
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum TriggerKind {
    Split(SplitTrigger),
    PaceDrift(PaceDriftTrigger),
    ZoneTransition(ZoneTransitionTrigger),
    ZoneDuration(ZoneDurationTrigger),
    CheckIn(CheckInTrigger),
}

impl TriggerKind {
    pub fn tag(&self) -> TriggerTag {
        match self {
            TriggerKind::Split(_) => TriggerTag::Split,
            TriggerKind::PaceDrift(_) => TriggerTag::PaceDrift,
            TriggerKind::ZoneTransition(_) => TriggerTag::ZoneTransition,
            TriggerKind::ZoneDuration(_) => TriggerTag::ZoneDuration,
            TriggerKind::CheckIn(_) => TriggerTag::CheckIn,
        }
    }

    /// Check-ins are `High` and never `Critical`, so they cannot cut off a
    /// safety message.
    pub fn default_priority(&self) -> Priority {
        match self {
            TriggerKind::Split(_) | TriggerKind::ZoneTransition(_) => Priority::Medium,
            TriggerKind::PaceDrift(_) | TriggerKind::ZoneDuration(_) | TriggerKind::CheckIn(_) => {
                Priority::High
            }
        }
    }

    pub fn category(&self) -> PromptCategory {
        match self {
            TriggerKind::Split(_) => PromptCategory::Split,
            TriggerKind::PaceDrift(_) => PromptCategory::PaceDrift,
            TriggerKind::ZoneTransition(_) => PromptCategory::ZoneTransition,
            TriggerKind::ZoneDuration(_) => PromptCategory::ZoneDuration,
            TriggerKind::CheckIn(_) => PromptCategory::CheckIn,
        }
    }

    /// Build the variant for `tag` from `config`.
    pub fn from_config(tag: TriggerTag, config: &CoachConfig) -> Self {
        let mut kind = match tag {
            TriggerTag::Split => TriggerKind::Split(SplitTrigger::default()),
            TriggerTag::PaceDrift => TriggerKind::PaceDrift(PaceDriftTrigger::default()),
            TriggerTag::ZoneTransition => {
                TriggerKind::ZoneTransition(ZoneTransitionTrigger::default())
            }
            TriggerTag::ZoneDuration => TriggerKind::ZoneDuration(ZoneDurationTrigger::default()),
            TriggerTag::CheckIn => TriggerKind::CheckIn(CheckInTrigger::default()),
        };
        kind.apply_config(config);
        kind
    }

    /// Pull variant thresholds from `config` and report whether the variant
    /// is switched on and which cooldown applies.
    pub fn apply_config(&mut self, config: &CoachConfig) -> TriggerParams {
        let coach = &config.coach;
        let engine = &config.engine;
        let params = match self {
            TriggerKind::Split(t) => {
                t.mode = coach.announce_splits;
                TriggerParams {
                    enabled: t.is_announcing(),
                    cooldown_secs: engine.split_cooldown_secs,
                }
            }
            TriggerKind::PaceDrift(t) => {
                t.drift_threshold = coach.pace_alerts.drift_threshold;
                t.warmup_secs = engine.pace_warmup_secs;
                TriggerParams {
                    enabled: coach.pace_alerts.enabled,
                    cooldown_secs: engine.pace_drift_cooldown_secs,
                }
            }
            TriggerKind::ZoneTransition(t) => {
                t.alert_zones = coach.zone_alerts.zones.clone();
                TriggerParams {
                    enabled: coach.zone_alerts.enabled && !t.alert_zones.is_empty(),
                    cooldown_secs: engine.zone_transition_cooldown_secs,
                }
            }
            TriggerKind::ZoneDuration(t) => {
                t.threshold_secs = engine.zone_duration_threshold_secs;
                t.min_zone = engine.zone_duration_min_zone;
                TriggerParams {
                    enabled: coach.zone_alerts.enabled,
                    cooldown_secs: engine.zone_duration_cooldown_secs,
                }
            }
            TriggerKind::CheckIn(t) => {
                t.interval_secs = coach.check_in_interval_secs;
                TriggerParams {
                    enabled: t.interval_secs > 0,
                    cooldown_secs: t.interval_secs as f64,
                }
            }
        };

        TriggerParams {
            enabled: coach.enabled && params.enabled,
            ..params
        }
    }

    pub fn observe(&mut self, ctx: &EvalContext<'_>) -> Result<(), TriggerError> {
        match self {
            TriggerKind::Split(t) => {
                t.observe(ctx);
                Ok(())
            }
            TriggerKind::ZoneDuration(t) => t.observe(ctx),
            TriggerKind::PaceDrift(_) | TriggerKind::ZoneTransition(_) | TriggerKind::CheckIn(_) => {
                Ok(())
            }
        }
    }

    pub fn should_fire(&self, ctx: &EvalContext<'_>) -> Result<bool, TriggerError> {
        match self {
            TriggerKind::Split(t) => Ok(t.should_fire()),
            TriggerKind::PaceDrift(t) => t.should_fire(ctx),
            TriggerKind::ZoneTransition(t) => Ok(t.should_fire(ctx)),
            TriggerKind::ZoneDuration(t) => Ok(t.should_fire()),
            TriggerKind::CheckIn(t) => Ok(t.should_fire(ctx)),
        }
    }

    pub fn generate_prompt(&self, ctx: &EvalContext<'_>) -> Result<String, TriggerError> {
        match self {
            TriggerKind::Split(t) => t.generate_prompt(ctx),
            TriggerKind::PaceDrift(t) => t.generate_prompt(ctx),
            TriggerKind::ZoneTransition(t) => t.generate_prompt(ctx),
            TriggerKind::ZoneDuration(t) => t.generate_prompt(ctx),
            TriggerKind::CheckIn(t) => Ok(t.generate_prompt()),
        }
    }

    pub fn on_fired(&mut self, ctx: &EvalContext<'_>) {
        match self {
            TriggerKind::Split(t) => t.on_fired(),
            TriggerKind::PaceDrift(_) => {}
            TriggerKind::ZoneTransition(t) => t.on_fired(ctx),
            TriggerKind::ZoneDuration(t) => t.on_fired(),
            TriggerKind::CheckIn(t) => t.on_fired(),
        }
    }

    pub fn reset_transient(&mut self) {
        match self {
            TriggerKind::Split(t) => t.reset(),
            TriggerKind::ZoneDuration(t) => t.reset(),
            TriggerKind::PaceDrift(_) | TriggerKind::ZoneTransition(_) | TriggerKind::CheckIn(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitAnnouncement;

    #[test]
    fn params_follow_settings() {
        let mut cfg = CoachConfig::default();
        cfg.coach.announce_splits = SplitAnnouncement::Off;
        cfg.coach.check_in_interval_secs = 0;
        cfg.engine.pace_drift_cooldown_secs = 45.0;

        let mut split = TriggerKind::from_config(TriggerTag::Split, &cfg);
        let mut pace = TriggerKind::from_config(TriggerTag::PaceDrift, &cfg);
        let mut check_in = TriggerKind::from_config(TriggerTag::CheckIn, &cfg);

        assert!(!split.apply_config(&cfg).enabled);
        assert!(!check_in.apply_config(&cfg).enabled);
        assert_eq!(
            pace.apply_config(&cfg),
            TriggerParams {
                enabled: true,
                cooldown_secs: 45.0
            }
        );
    }

    #[test]
    fn master_switch_disables_everything() {
        let mut cfg = CoachConfig::default();
        cfg.coach.enabled = false;
        for tag in [
            TriggerTag::Split,
            TriggerTag::PaceDrift,
            TriggerTag::ZoneTransition,
            TriggerTag::ZoneDuration,
            TriggerTag::CheckIn,
        ] {
            let mut kind = TriggerKind::from_config(tag, &cfg);
            assert!(!kind.apply_config(&cfg).enabled, "{}", tag.label());
        }
    }

    #[test]
    fn check_in_cooldown_is_its_interval() {
        let mut cfg = CoachConfig::default();
        cfg.coach.check_in_interval_secs = 300;
        let mut kind = TriggerKind::from_config(TriggerTag::CheckIn, &cfg);
        assert_eq!(kind.apply_config(&cfg).cooldown_secs, 300.0);
        assert_eq!(kind.default_priority(), Priority::High);
        assert_eq!(kind.category(), PromptCategory::CheckIn);
    }
}
