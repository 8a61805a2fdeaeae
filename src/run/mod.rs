//! Live run data: per-tick snapshots, heart-rate zones, splits and units.
//!
//! - [`snapshot`]: [`RunStateSnapshot`] and the [`RunStateProvider`] seam
//! - [`zones`]: [`Zone`] and Karvonen [`zone_for`]
//! - [`splits`]: [`SplitTracker`] boundary detection
//! - [`units`]: [`DistanceUnit`] and spoken formatting helpers

pub mod snapshot;
pub mod splits;
pub mod units;
pub mod zones;

pub use snapshot::{RunStateProvider, RunStateSnapshot};
pub use splits::{Split, SplitTracker};
pub use units::{format_distance, format_duration, format_pace, DistanceUnit};
pub use zones::{zone_for, Zone, ZoneError};
