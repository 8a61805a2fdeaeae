//! Split tracking: detects every crossing of a whole distance unit.
//!
//! Boundaries are computed as `base + n * unit` rather than accumulated, so
//! floating-point error never drifts a boundary over a long run.

use crate::run::units::DistanceUnit;

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// One completed split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// 1-based split number.
    pub index: u32,
    /// Split length in metres (one unit).
    pub distance_meters: f64,
    /// Time taken to cover the split, in seconds.
    pub duration_secs: f64,
    pub pace_sec_per_km: f64,
    /// Run time at which the boundary was crossed.
    pub completed_at_secs: f64,
}

// ---------------------------------------------------------------------------
// SplitTracker
// ---------------------------------------------------------------------------

/// Incremental split detector fed with `(elapsed, distance)` samples.
///
/// The crossing time of each boundary is interpolated linearly between the
/// two samples that straddle it, so a coarse tick still yields accurate split
/// times. A sample that goes backwards, or is not finite, is ignored.
#[derive(Debug, Clone)]
pub struct SplitTracker {
    unit: DistanceUnit,
    /// Distance at which split counting (re)started.
    base_meters: f64,
    /// Number of boundaries crossed since `base_meters`.
    crossed: u32,
    /// Run time at the most recent boundary (split start).
    last_boundary_secs: f64,
    /// Previous sample.
    last_sample: Option<(f64, f64)>,
    splits: Vec<Split>,
}

impl SplitTracker {
    pub fn new(unit: DistanceUnit) -> Self {
        Self {
            unit,
            base_meters: 0.0,
            crossed: 0,
            last_boundary_secs: 0.0,
            last_sample: None,
            splits: Vec::new(),
        }
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// All splits completed so far, oldest first.
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn last(&self) -> Option<&Split> {
        self.splits.last()
    }

    /// Feed a sample and return the splits completed by it.
    ///
    /// Several splits can complete in one call when the sample jumps over
    /// more than one boundary.
    pub fn observe(&mut self, elapsed_secs: f64, distance_meters: f64) -> &[Split] {
        let before = self.splits.len();

        if !elapsed_secs.is_finite() || !distance_meters.is_finite() {
            return &self.splits[before..];
        }

        let (prev_t, prev_d) = match self.last_sample {
            Some(prev) => prev,
            None => (0.0, self.base_meters.min(distance_meters)),
        };
        if elapsed_secs < prev_t || distance_meters < prev_d {
            return &self.splits[before..];
        }

        let unit_m = self.unit.meters();
        loop {
            let boundary = self.base_meters + f64::from(self.crossed + 1) * unit_m;
            if distance_meters < boundary {
                break;
            }

            let span = distance_meters - prev_d;
            let fraction = if span > 0.0 {
                ((boundary - prev_d) / span).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let at = prev_t + fraction * (elapsed_secs - prev_t);
            let duration = (at - self.last_boundary_secs).max(0.0);

            self.crossed += 1;
            self.splits.push(Split {
                index: self.splits.len() as u32 + 1,
                distance_meters: unit_m,
                duration_secs: duration,
                pace_sec_per_km: duration * 1_000.0 / unit_m,
                completed_at_secs: at,
            });
            self.last_boundary_secs = at;
        }

        self.last_sample = Some((elapsed_secs, distance_meters));
        &self.splits[before..]
    }

    /// Switch units mid-run.
    ///
    /// Completed splits are kept; the next split starts at the most recent
    /// sample and is measured in the new unit.
    pub fn set_unit(&mut self, unit: DistanceUnit) {
        if unit == self.unit {
            return;
        }
        self.unit = unit;
        self.crossed = 0;
        match self.last_sample {
            Some((t, d)) => {
                self.base_meters = d;
                self.last_boundary_secs = t;
            }
            None => {
                self.base_meters = 0.0;
                self.last_boundary_secs = 0.0;
            }
        }
    }

    /// Forget everything and count in `unit`; used when a new session starts.
    pub fn reset(&mut self, unit: DistanceUnit) {
        *self = Self::new(unit);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
