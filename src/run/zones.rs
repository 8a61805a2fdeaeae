//! Heart-rate zones from the Karvonen heart-rate reserve.
//!
//! `reserve = (hr - resting) / (max - resting)`
//!
//! | Zone | Name      | Reserve        |
//! |------|-----------|----------------|
//! | 1    | Recovery  | below 60 %     |
//! | 2    | Endurance | 60 – 70 %      |
//! | 3    | Tempo     | 70 – 80 %      |
//! | 4    | Threshold | 80 – 90 %      |
//! | 5    | Maximum   | 90 % and above |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper reserve fraction of zones 1–4; anything at or above the last one is
/// zone 5.
const ZONE_UPPER_BOUNDS: [f64; 4] = [0.6, 0.7, 0.8, 0.9];

const ZONE_NAMES: [&str; 5] = ["recovery", "endurance", "tempo", "threshold", "maximum"];

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A heart-rate zone, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Zone(u8);

/// A zone number outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("heart-rate zone must be between 1 and 5, got {0}")]
pub struct ZoneError(pub u8);

impl Zone {
    pub const RECOVERY: Zone = Zone(1);
    pub const ENDURANCE: Zone = Zone(2);
    pub const TEMPO: Zone = Zone(3);
    pub const THRESHOLD: Zone = Zone(4);
    pub const MAXIMUM: Zone = Zone(5);

    /// `Some(zone)` for `1..=5`.
    pub fn new(number: u8) -> Option<Self> {
        (1..=5).contains(&number).then_some(Zone(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Lower-case zone name used in spoken prompts.
    pub fn name(self) -> &'static str {
        ZONE_NAMES[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for Zone {
    type Error = ZoneError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Zone::new(value).ok_or(ZoneError(value))
    }
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> Self {
        zone.0
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zone {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// zone_for
// ---------------------------------------------------------------------------

/// Map a heart rate to its zone for an athlete with `max_hr` / `resting_hr`.
///
/// Returns `None` when `heart_rate` is absent or when the profile has no
/// usable reserve (`max_hr <= resting_hr`). Rates under the zone-1 floor
/// still count as zone 1.
///
/// ```
/// use runaway_coach::run::{zone_for, Zone};
///
/// assert_eq!(zone_for(Some(165), 190, 60), Some(Zone::THRESHOLD));
/// assert_eq!(zone_for(None, 190, 60), None);
/// ```
pub fn zone_for(heart_rate: Option<u16>, max_hr: u16, resting_hr: u16) -> Option<Zone> {
    let hr = heart_rate?;
    if max_hr <= resting_hr {
        return None;
    }

    let reserve = (f64::from(hr) - f64::from(resting_hr)) / f64::from(max_hr - resting_hr);
    let index = ZONE_UPPER_BOUNDS
        .iter()
        .position(|&upper| reserve < upper)
        .unwrap_or(ZONE_UPPER_BOUNDS.len());

    Zone::new(index as u8 + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
