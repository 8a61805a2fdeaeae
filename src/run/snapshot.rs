//! Immutable per-tick view of the live run metrics.
//!
//! [`RunStateSnapshot`] is produced by the host's activity recorder (a
//! [`RunStateProvider`]) and pulled once per tick by the engine. A new
//! snapshot is created every tick; nothing in the coach mutates one after it
//! has been handed over, apart from filling in a missing zone.

use crate::run::zones::Zone;

// ---------------------------------------------------------------------------
// RunStateSnapshot
// ---------------------------------------------------------------------------

/// Current run metrics.
///
/// `elapsed_secs` and `distance_meters` never decrease while the run is
/// active and are frozen while it is paused. A pace of `0` or less means the
/// recorder has no reading yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunStateSnapshot {
    /// Active (non-paused) run time in seconds.
    pub elapsed_secs: f64,
    pub distance_meters: f64,
    pub current_pace_sec_per_km: f64,
    pub average_pace_sec_per_km: f64,
    pub current_heart_rate: Option<u16>,
    pub current_zone: Option<Zone>,
    /// Pace the runner is aiming for, when a workout defines one.
    pub target_pace_sec_per_km: Option<f64>,
    pub is_paused: bool,
}

impl RunStateSnapshot {
    /// A snapshot at `elapsed_secs` / `distance_meters` with no pace, heart
    /// rate or target.
    pub fn new(elapsed_secs: f64, distance_meters: f64) -> Self {
        Self {
            elapsed_secs,
            distance_meters,
            ..Self::default()
        }
    }

    pub fn with_pace(mut self, current_sec_per_km: f64, average_sec_per_km: f64) -> Self {
        self.current_pace_sec_per_km = current_sec_per_km;
        self.average_pace_sec_per_km = average_sec_per_km;
        self
    }

    pub fn with_heart_rate(mut self, bpm: u16) -> Self {
        self.current_heart_rate = Some(bpm);
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.current_zone = Some(zone);
        self
    }

    pub fn with_target_pace(mut self, sec_per_km: f64) -> Self {
        self.target_pace_sec_per_km = Some(sec_per_km);
        self
    }

    pub fn paused(mut self) -> Self {
        self.is_paused = true;
        self
    }
}

// ---------------------------------------------------------------------------
// RunStateProvider
// ---------------------------------------------------------------------------

/// Pull-based access to the latest run metrics.
///
/// Implemented by the host's activity recorder; called once per tick from the
/// coach loop, so it must return quickly and never block on I/O.
pub trait RunStateProvider: Send + Sync {
    fn snapshot(&self) -> RunStateSnapshot;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn RunStateProvider>) {}
};
