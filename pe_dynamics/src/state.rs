//! Cartesian state vectors.

use nalgebra::{Vector3, Vector6};
use serde::{Deserialize, Serialize};

/// Position and velocity of a spacecraft in a single fixed inertial frame.
///
/// Units are meters and meters/second throughout the workspace. A state with
/// any NaN or infinite component is never valid inside a running episode;
/// producers must check with [`CartesianState::is_finite`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianState {
    /// Position [x, y, z] in meters
    pub position: Vector3<f64>,

    /// Velocity [vx, vy, vz] in m/s
    pub velocity: Vector3<f64>,
}

impl CartesianState {
    /// Creates a state from position and velocity vectors.
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Creates a state from a packed 6-vector [x, y, z, vx, vy, vz].
    pub fn from_vector6(v: Vector6<f64>) -> Self {
        Self {
            position: Vector3::new(v[0], v[1], v[2]),
            velocity: Vector3::new(v[3], v[4], v[5]),
        }
    }

    /// Returns the state as a packed 6-vector [x, y, z, vx, vy, vz].
    pub fn as_vector6(&self) -> Vector6<f64> {
        Vector6::new(
            self.position.x, self.position.y, self.position.z,
            self.velocity.x, self.velocity.y, self.velocity.z,
        )
    }

    /// Returns true when all six components are finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }

    /// Euclidean distance between the two position components, in meters.
    pub fn distance_to(&self, other: &CartesianState) -> f64 {
        (self.position - other.position).norm()
    }

    /// Magnitude of the velocity difference, in m/s.
    pub fn speed_relative_to(&self, other: &CartesianState) -> f64 {
        (self.velocity - other.velocity).norm()
    }

    /// Returns a copy with the impulse added to the velocity component.
    pub fn with_impulse(&self, dv: Vector3<f64>) -> Self {
        Self {
            position: self.position,
            velocity: self.velocity + dv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector6_round_trip() {
        let state = CartesianState::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-4.0, 5.0, -6.0),
        );

        let packed = state.as_vector6();
        assert_eq!(CartesianState::from_vector6(packed), state);
    }

    #[test]
    fn test_with_impulse_leaves_position() {
        let state = CartesianState::new(Vector3::new(7e6, 0.0, 0.0), Vector3::new(0.0, 7.5e3, 0.0));
        let kicked = state.with_impulse(Vector3::new(1.0, -2.0, 0.5));

        assert_eq!(kicked.position, state.position);
        assert_eq!(kicked.velocity, Vector3::new(1.0, 7.5e3 - 2.0, 0.5));
    }

    #[test]
    fn test_distance_and_relative_speed() {
        let a = CartesianState::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let b = CartesianState::new(Vector3::new(3.0, 4.0, 0.0), Vector3::new(0.0, 1.0, 0.0));

        assert_eq!(a.distance_to(&b), 5.0);
        assert!((a.speed_relative_to(&b) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_is_finite_rejects_nan() {
        let mut state = CartesianState::new(Vector3::zeros(), Vector3::zeros());
        assert!(state.is_finite());

        state.velocity.y = f64::NAN;
        assert!(!state.is_finite());
    }
}
