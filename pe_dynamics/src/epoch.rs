//! Absolute simulation time.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A UTC calendar timestamp marking a point in simulation time.
///
/// Epochs only move forward inside an episode: every propagation advances the
/// epoch by exactly the step interval, and the episode controller cross-checks
/// its own clock against the propagator's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(pub DateTime<Utc>);

impl Epoch {
    /// Creates an epoch from a calendar date and time (UTC).
    ///
    /// Returns `None` for out-of-range dates.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Epoch)
    }

    /// Returns this epoch advanced by `secs` seconds.
    ///
    /// Resolution is one microsecond; `secs` may be negative. Non-finite
    /// inputs must be rejected by the caller before reaching the clock.
    pub fn advance(&self, secs: f64) -> Epoch {
        Epoch(self.0 + chrono::Duration::microseconds((secs * 1e6).round() as i64))
    }

    /// Seconds elapsed from `earlier` to this epoch (negative if earlier).
    pub fn seconds_since(&self, earlier: &Epoch) -> f64 {
        let delta = self.0 - earlier.0;
        match delta.num_microseconds() {
            Some(us) => us as f64 / 1e6,
            None => delta.num_milliseconds() as f64 / 1e3,
        }
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates_exactly() {
        let start = Epoch::from_ymd_hms(2030, 1, 1, 0, 0, 0).unwrap();

        let mut epoch = start;
        for _ in 0..60 {
            epoch = epoch.advance(60.0);
        }

        assert_eq!(epoch, start.advance(3600.0));
        assert_eq!(epoch.seconds_since(&start), 3600.0);
    }

    #[test]
    fn test_seconds_since_is_signed() {
        let start = Epoch::from_ymd_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let later = start.advance(90.0);

        assert_eq!(later.seconds_since(&start), 90.0);
        assert_eq!(start.seconds_since(&later), -90.0);
    }

    #[test]
    fn test_fractional_seconds() {
        let start = Epoch::from_ymd_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let later = start.advance(0.5);

        assert!((later.seconds_since(&start) - 0.5).abs() < 1e-9);
    }
}
