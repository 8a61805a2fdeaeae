//! Distance units and the spoken formatting of pace, time and distance.
//!
//! Every value the engine works with is metric (`sec/km`, metres, seconds);
//! conversion to the runner's unit only happens here, right before text is
//! handed to the speech output.

use serde::{Deserialize, Serialize};

const METERS_PER_MILE: f64 = 1_609.344;

// ---------------------------------------------------------------------------
// DistanceUnit
// ---------------------------------------------------------------------------

/// Unit used for split boundaries and spoken distances / paces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl Default for DistanceUnit {
    fn default() -> Self {
        Self::Kilometers
    }
}

impl DistanceUnit {
    /// Length of one unit in metres.
    pub fn meters(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => 1_000.0,
            DistanceUnit::Miles => METERS_PER_MILE,
        }
    }

    /// Singular noun, e.g. `"kilometer"`.
    pub fn singular(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "kilometer",
            DistanceUnit::Miles => "mile",
        }
    }

    /// Plural noun, e.g. `"kilometers"`.
    pub fn plural(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Miles => "miles",
        }
    }

    /// Convert a pace in seconds per kilometre to seconds per this unit.
    pub fn pace_from_sec_per_km(self, sec_per_km: f64) -> f64 {
        sec_per_km * self.meters() / 1_000.0
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format a pace as `m:ss` per `unit`.
///
/// Returns `None` for a pace that is not finite or not positive (no reading).
///
/// ```
/// use runaway_coach::run::{format_pace, DistanceUnit};
///
/// assert_eq!(format_pace(300.0, DistanceUnit::Kilometers).as_deref(), Some("5:00"));
/// assert_eq!(format_pace(0.0, DistanceUnit::Kilometers), None);
/// ```
pub fn format_pace(sec_per_km: f64, unit: DistanceUnit) -> Option<String> {
    if !sec_per_km.is_finite() || sec_per_km <= 0.0 {
        return None;
    }
    let total = unit.pace_from_sec_per_km(sec_per_km).round() as u64;
    Some(format!("{}:{:02}", total / 60, total % 60))
}

/// Format a duration as `m:ss`, or `h:mm:ss` past one hour.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.round() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3_600, (total % 3_600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Format a distance with two decimals in `unit`, e.g. `"3.25 kilometers"`.
pub fn format_distance(meters: f64, unit: DistanceUnit) -> String {
    let value = if meters.is_finite() && meters > 0.0 {
        meters / unit.meters()
    } else {
        0.0
    };
    format!("{value:.2} {}", unit.plural())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_rounds_to_whole_seconds() {
        assert_eq!(
            format_pace(302.4, DistanceUnit::Kilometers).as_deref(),
            Some("5:02")
        );
        assert_eq!(
            format_pace(299.6, DistanceUnit::Kilometers).as_deref(),
            Some("5:00")
        );
    }

    #[test]
    fn pace_converts_to_miles() {
        // 5:00/km ≈ 8:03/mi
        assert_eq!(format_pace(300.0, DistanceUnit::Miles).as_deref(), Some("8:03"));
    }

    #[test]
    fn pace_without_reading_is_none() {
        assert_eq!(format_pace(-1.0, DistanceUnit::Kilometers), None);
        assert_eq!(format_pace(f64::NAN, DistanceUnit::Kilometers), None);
        assert_eq!(format_pace(f64::INFINITY, DistanceUnit::Miles), None);
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(3_725.0), "1:02:05");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn distance_formats() {
        assert_eq!(format_distance(3_250.0, DistanceUnit::Kilometers), "3.25 kilometers");
        assert_eq!(format_distance(1_609.344, DistanceUnit::Miles), "1.00 miles");
    }
}
