//! Heart-rate zone alerts: zone entry and time spent in a high zone.

use std::collections::BTreeSet;

use crate::run::Zone;
use crate::triggers::kind::EvalContext;
use crate::triggers::trigger::TriggerError;

// ---------------------------------------------------------------------------
// ZoneTransitionTrigger
// ---------------------------------------------------------------------------

/// Fires when the current zone differs from the zone announced last time and
/// belongs to the alert set.
#[derive(Debug, Clone)]
pub struct ZoneTransitionTrigger {
    pub alert_zones: BTreeSet<Zone>,
    last_fired_zone: Option<Zone>,
}

impl Default for ZoneTransitionTrigger {
    fn default() -> Self {
        Self::new([Zone::THRESHOLD, Zone::MAXIMUM].into_iter().collect())
    }
}

impl ZoneTransitionTrigger {
    pub fn new(alert_zones: BTreeSet<Zone>) -> Self {
        Self {
            alert_zones,
            last_fired_zone: None,
        }
    }

    pub fn last_fired_zone(&self) -> Option<Zone> {
        self.last_fired_zone
    }

    pub(crate) fn should_fire(&self, ctx: &EvalContext<'_>) -> bool {
        match ctx.snapshot.current_zone {
            Some(zone) => Some(zone) != self.last_fired_zone && self.alert_zones.contains(&zone),
            None => false,
        }
    }

    pub(crate) fn generate_prompt(&self, ctx: &EvalContext<'_>) -> Result<String, TriggerError> {
        let zone = ctx
            .snapshot
            .current_zone
            .ok_or(TriggerError::MissingData("heart-rate zone"))?;
        let verb = match self.last_fired_zone {
            Some(prev) if prev > zone => "Dropping to",
            _ => "Entering",
        };
        Ok(format!("{verb} zone {}, {}.", zone.number(), zone.name()))
    }

    pub(crate) fn on_fired(&mut self, ctx: &EvalContext<'_>) {
        self.last_fired_zone = ctx.snapshot.current_zone;
    }
}

// ---------------------------------------------------------------------------
// ZoneDurationTrigger
// ---------------------------------------------------------------------------

/// Fires after `threshold_secs` of consecutive run time at or above
/// `min_zone`, then starts counting a fresh streak.
///
/// Time is accumulated from run-time deltas between ticks, so paused time and
/// backwards samples never count. Dropping below `min_zone` (or losing the
/// heart-rate reading) ends the streak.
#[derive(Debug, Clone)]
pub struct ZoneDurationTrigger {
    pub threshold_secs: f64,
    pub min_zone: Zone,
    accumulated_secs: f64,
    last_sample_secs: Option<f64>,
}

impl Default for ZoneDurationTrigger {
    fn default() -> Self {
        Self::new(180.0, Zone::THRESHOLD)
    }
}

impl ZoneDurationTrigger {
    pub fn new(threshold_secs: f64, min_zone: Zone) -> Self {
        Self {
            threshold_secs,
            min_zone,
            accumulated_secs: 0.0,
            last_sample_secs: None,
        }
    }

    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    pub(crate) fn observe(&mut self, ctx: &EvalContext<'_>) -> Result<(), TriggerError> {
        let now = ctx.snapshot.elapsed_secs;
        if !now.is_finite() {
            return Err(TriggerError::InvalidMetric {
                metric: "elapsed time",
                value: now,
            });
        }

        match ctx.snapshot.current_zone {
            Some(zone) if zone >= self.min_zone => {
                if let Some(prev) = self.last_sample_secs {
                    if now > prev {
                        self.accumulated_secs += now - prev;
                    }
                }
                let latest = self.last_sample_secs.map_or(now, |prev| prev.max(now));
                self.last_sample_secs = Some(latest);
            }
            _ => self.reset(),
        }
        Ok(())
    }

    pub(crate) fn should_fire(&self) -> bool {
        self.accumulated_secs >= self.threshold_secs
    }

    pub(crate) fn generate_prompt(&self, ctx: &EvalContext<'_>) -> Result<String, TriggerError> {
        let zone = ctx
            .snapshot
            .current_zone
            .ok_or(TriggerError::MissingData("heart-rate zone"))?;
        let minutes = (self.accumulated_secs / 60.0).round() as u64;
        let span = match minutes {
            0 | 1 => "a minute".to_string(),
            n => format!("{n} minutes"),
        };
        Ok(format!(
            "You've been in zone {} for {span}. Ease off if you need to.",
            zone.number()
        ))
    }

    pub(crate) fn on_fired(&mut self) {
        self.accumulated_secs = 0.0;
    }

    pub(crate) fn reset(&mut self) {
        self.accumulated_secs = 0.0;
        self.last_sample_secs = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
