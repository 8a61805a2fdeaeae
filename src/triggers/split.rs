//! Split announcements.

use crate::config::SplitAnnouncement;
use crate::run::{format_duration, format_pace, DistanceUnit, Split};
use crate::triggers::kind::EvalContext;
use crate::triggers::trigger::TriggerError;

/// Fires when a split completed since the last announcement.
///
/// The cooldown is only a safety net; the real gate is a pending split. When
/// several splits complete before the trigger can fire, only the most recent
/// one is announced.
#[derive(Debug, Clone, Default)]
pub struct SplitTrigger {
    pub mode: SplitAnnouncement,
    pending: Option<Split>,
}

impl SplitTrigger {
    pub fn new(mode: SplitAnnouncement) -> Self {
        Self { mode, pending: None }
    }

    pub fn is_announcing(&self) -> bool {
        self.mode != SplitAnnouncement::Off
    }

    pub fn pending(&self) -> Option<&Split> {
        self.pending.as_ref()
    }

    pub(crate) fn observe(&mut self, ctx: &EvalContext<'_>) {
        if let Some(latest) = ctx.new_splits.last() {
            self.pending = Some(latest.clone());
        }
    }

    pub(crate) fn should_fire(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn generate_prompt(&self, ctx: &EvalContext<'_>) -> Result<String, TriggerError> {
        let split = self
            .pending
            .as_ref()
            .ok_or(TriggerError::MissingData("pending split"))?;
        if !split.duration_secs.is_finite() {
            return Err(TriggerError::InvalidMetric {
                metric: "split duration",
                value: split.duration_secs,
            });
        }

        let mut message = basic_message(split, ctx.unit);
        if self.mode == SplitAnnouncement::Detailed {
            append_details(&mut message, split, ctx);
        }
        Ok(message)
    }

    pub(crate) fn on_fired(&mut self) {
        self.pending = None;
    }

    pub(crate) fn reset(&mut self) {
        self.pending = None;
    }
}

// -- message building -------------------------------------------------------

fn basic_message(split: &Split, unit: DistanceUnit) -> String {
    let noun = capitalize(unit.singular());
    match format_pace(split.pace_sec_per_km, unit) {
        Some(pace) => format!("{noun} {} in {pace} per {}.", split.index, unit.singular()),
        None => format!("{noun} {} complete.", split.index),
    }
}

fn append_details(message: &mut String, split: &Split, ctx: &EvalContext<'_>) {
    message.push_str(&format!(
        " Total time {}.",
        format_duration(split.completed_at_secs)
    ));

    if let Some(avg) = format_pace(ctx.snapshot.average_pace_sec_per_km, ctx.unit) {
        message.push_str(&format!(" Average pace {avg}."));
    }

    let previous = ctx
        .splits
        .iter()
        .find(|s| s.index + 1 == split.index && (s.distance_meters - split.distance_meters).abs() < 1e-6);
    if let Some(prev) = previous {
        let delta = (split.duration_secs - prev.duration_secs).round();
        if delta.is_finite() {
            let secs = delta.abs() as u64;
            let plural = if secs == 1 { "" } else { "s" };
            if secs == 0 {
                message.push_str(" Same as the last split.");
            } else if delta < 0.0 {
                message.push_str(&format!(" {secs} second{plural} faster than the last split."));
            } else {
                message.push_str(&format!(" {secs} second{plural} slower than the last split."));
            }
        }
    }

    if let Some(hr) = ctx.snapshot.current_heart_rate {
        message.push_str(&format!(" Heart rate {hr}."));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunStateSnapshot;

    fn split(index: u32, duration: f64, at: f64) -> Split {
        Split {
            index,
            distance_meters: 1_000.0,
            duration_secs: duration,
            pace_sec_per_km: duration,
            completed_at_secs: at,
        }
    }

    fn ctx<'a>(
        snapshot: &'a RunStateSnapshot,
        new_splits: &'a [Split],
        splits: &'a [Split],
    ) -> EvalContext<'a> {
        EvalContext {
            snapshot,
            new_splits,
            splits,
            unit: DistanceUnit::Kilometers,
        }
    }

    #[test]
    fn basic_message_names_index_and_pace() {
        let snap = RunStateSnapshot::new(300.0, 1_000.0);
        let splits = [split(1, 300.0, 300.0)];
        let mut t = SplitTrigger::new(SplitAnnouncement::Basic);

        t.observe(&ctx(&snap, &splits, &splits));
        assert!(t.should_fire());
        let msg = t.generate_prompt(&ctx(&snap, &[], &splits)).unwrap();
        assert_eq!(msg, "Kilometer 1 in 5:00 per kilometer.");

        t.on_fired();
        assert!(!t.should_fire());
    }

    #[test]
    fn latest_split_wins_when_several_pending() {
        let snap = RunStateSnapshot::new(600.0, 2_000.0);
        let splits = [split(1, 300.0, 300.0), split(2, 302.0, 602.0)];
        let mut t = SplitTrigger::new(SplitAnnouncement::Basic);

        t.observe(&ctx(&snap, &splits, &splits));
        assert_eq!(t.pending().map(|s| s.index), Some(2));
        let msg = t.generate_prompt(&ctx(&snap, &[], &splits)).unwrap();
        assert_eq!(msg, "Kilometer 2 in 5:02 per kilometer.");
    }

    #[test]
    fn detailed_message_compares_with_previous_split() {
        let snap = RunStateSnapshot::new(595.0, 2_000.0)
            .with_pace(290.0, 297.5)
            .with_heart_rate(152);
        let splits = [split(1, 300.0, 300.0), split(2, 295.0, 595.0)];
        let mut t = SplitTrigger::new(SplitAnnouncement::Detailed);

        t.observe(&ctx(&snap, &splits[1..], &splits));
        let msg = t.generate_prompt(&ctx(&snap, &[], &splits)).unwrap();
        assert_eq!(
            msg,
            "Kilometer 2 in 4:55 per kilometer. Total time 9:55. Average pace 4:58. \
             5 seconds faster than the last split. Heart rate 152."
        );
    }

    #[test]
    fn miles_use_mile_wording() {
        let snap = RunStateSnapshot::new(480.0, 1_609.344);
        let mile = Split {
            index: 1,
            distance_meters: 1_609.344,
            duration_secs: 480.0,
            pace_sec_per_km: 480.0 * 1_000.0 / 1_609.344,
            completed_at_secs: 480.0,
        };
        let splits = [mile];
        let mut t = SplitTrigger::new(SplitAnnouncement::Basic);
        let c = EvalContext {
            snapshot: &snap,
            new_splits: &splits,
            splits: &splits,
            unit: DistanceUnit::Miles,
        };
        t.observe(&c);
        assert_eq!(t.generate_prompt(&c).unwrap(), "Mile 1 in 8:00 per mile.");
    }

    #[test]
    fn non_finite_duration_is_an_error() {
        let snap = RunStateSnapshot::new(300.0, 1_000.0);
        let splits = [split(1, f64::NAN, 300.0)];
        let mut t = SplitTrigger::new(SplitAnnouncement::Basic);
        t.observe(&ctx(&snap, &splits, &splits));
        assert!(t.generate_prompt(&ctx(&snap, &[], &splits)).is_err());
    }
}
