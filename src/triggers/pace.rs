//! Pace-drift alerts.

use crate::triggers::kind::EvalContext;
use crate::triggers::trigger::TriggerError;

/// Fires when the current pace drifts from the reference pace by at least
/// `drift_threshold` (relative).
///
/// The reference is the target pace when the workout sets one, otherwise the
/// running average. Alerts are held off for `warmup_secs` of run time because
/// GPS pace is unreliable right after the start.
#[derive(Debug, Clone)]
pub struct PaceDriftTrigger {
    pub drift_threshold: f64,
    pub warmup_secs: f64,
}

impl Default for PaceDriftTrigger {
    fn default() -> Self {
        Self::new(0.10, 120.0)
    }
}

/// Which pace the current one is compared against.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reference {
    Target(f64),
    Average(f64),
}

impl Reference {
    fn pace(self) -> f64 {
        match self {
            Reference::Target(p) | Reference::Average(p) => p,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Reference::Target(_) => "target pace",
            Reference::Average(_) => "average pace",
        }
    }
}

impl PaceDriftTrigger {
    pub fn new(drift_threshold: f64, warmup_secs: f64) -> Self {
        Self {
            drift_threshold,
            warmup_secs,
        }
    }

    /// `None` while there is no usable reading.
    fn readings(&self, ctx: &EvalContext<'_>) -> Result<Option<(f64, Reference)>, TriggerError> {
        let snap = ctx.snapshot;
        let current = finite("current pace", snap.current_pace_sec_per_km)?;
        let reference = match snap.target_pace_sec_per_km {
            Some(target) => Reference::Target(finite("target pace", target)?),
            None => Reference::Average(finite("average pace", snap.average_pace_sec_per_km)?),
        };

        if current <= 0.0 || reference.pace() <= 0.0 {
            return Ok(None);
        }
        Ok(Some((current, reference)))
    }

    pub(crate) fn should_fire(&self, ctx: &EvalContext<'_>) -> Result<bool, TriggerError> {
        if ctx.snapshot.elapsed_secs < self.warmup_secs {
            return Ok(false);
        }
        Ok(match self.readings(ctx)? {
            Some((current, reference)) => {
                let r = reference.pace();
                (current - r).abs() / r >= self.drift_threshold
            }
            None => false,
        })
    }

    pub(crate) fn generate_prompt(&self, ctx: &EvalContext<'_>) -> Result<String, TriggerError> {
        let (current, reference) = self
            .readings(ctx)?
            .ok_or(TriggerError::MissingData("pace reading"))?;

        let delta = ctx.unit.pace_from_sec_per_km(current - reference.pace());
        let secs = delta.abs().round() as u64;
        // Lower sec/km means faster.
        let direction = if delta < 0.0 { "faster" } else { "slower" };
        Ok(format!(
            "You're {secs} seconds per {} {direction} than your {}.",
            ctx.unit.singular(),
            reference.noun()
        ))
    }
}

fn finite(metric: &'static str, value: f64) -> Result<f64, TriggerError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TriggerError::InvalidMetric { metric, value })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{DistanceUnit, RunStateSnapshot};

    fn ctx(snapshot: &RunStateSnapshot) -> EvalContext<'_> {
        EvalContext {
            snapshot,
            new_splits: &[],
            splits: &[],
            unit: DistanceUnit::Kilometers,
        }
    }

    #[test]
    fn held_off_during_warmup() {
        let t = PaceDriftTrigger::new(0.10, 120.0);
        let snap = RunStateSnapshot::new(60.0, 200.0).with_pace(400.0, 300.0);
        assert!(!t.should_fire(&ctx(&snap)).unwrap());
    }

    #[test]
    fn fires_on_drift_from_average() {
        let t = PaceDriftTrigger::new(0.10, 120.0);
        let snap = RunStateSnapshot::new(600.0, 2_000.0).with_pace(340.0, 300.0);
        assert!(t.should_fire(&ctx(&snap)).unwrap());
        assert_eq!(
            t.generate_prompt(&ctx(&snap)).unwrap(),
            "You're 40 seconds per kilometer slower than your average pace."
        );
    }

    #[test]
    fn small_drift_does_not_fire() {
        let t = PaceDriftTrigger::new(0.10, 120.0);
        let snap = RunStateSnapshot::new(600.0, 2_000.0).with_pace(310.0, 300.0);
        assert!(!t.should_fire(&ctx(&snap)).unwrap());
    }

    #[test]
    fn target_pace_takes_precedence() {
        let t = PaceDriftTrigger::new(0.10, 0.0);
        let snap = RunStateSnapshot::new(600.0, 2_000.0)
            .with_pace(270.0, 272.0)
            .with_target_pace(330.0);
        assert!(t.should_fire(&ctx(&snap)).unwrap());
        assert_eq!(
            t.generate_prompt(&ctx(&snap)).unwrap(),
            "You're 60 seconds per kilometer faster than your target pace."
        );
    }

    #[test]
    fn no_reading_does_not_fire() {
        let t = PaceDriftTrigger::new(0.10, 0.0);
        let snap = RunStateSnapshot::new(600.0, 2_000.0).with_pace(0.0, 300.0);
        assert!(!t.should_fire(&ctx(&snap)).unwrap());
    }

    #[test]
    fn non_finite_pace_is_an_error() {
        let t = PaceDriftTrigger::new(0.10, 0.0);
        let snap = RunStateSnapshot::new(600.0, 2_000.0).with_pace(300.0, f64::INFINITY);
        assert_eq!(
            t.should_fire(&ctx(&snap)),
            Err(TriggerError::InvalidMetric {
                metric: "average pace",
                value: f64::INFINITY
            })
        );
    }
}
