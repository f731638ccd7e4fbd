//! Classical orbital elements.

use serde::{Deserialize, Serialize};

/// The six classical orbital elements of a two-body orbit.
///
/// Lengths in meters, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassicalElements {
    /// Semi-major axis, m
    pub sma: f64,

    /// Eccentricity, dimensionless
    pub ecc: f64,

    /// Inclination, rad
    pub inc: f64,

    /// Right ascension of the ascending node, rad
    pub raan: f64,

    /// Argument of perigee, rad
    pub argp: f64,

    /// True anomaly, rad
    pub true_anomaly: f64,
}

impl ClassicalElements {
    /// Returns a copy with a different true anomaly, other elements unchanged.
    pub fn at_true_anomaly(&self, true_anomaly: f64) -> Self {
        Self { true_anomaly, ..*self }
    }

    /// Returns true when all six elements are finite.
    pub fn is_finite(&self) -> bool {
        [self.sma, self.ecc, self.inc, self.raan, self.argp, self.true_anomaly]
            .iter()
            .all(|e| e.is_finite())
    }
}
