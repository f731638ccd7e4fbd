//! Action validation and clamping.

use nalgebra::Vector3;

/// An impulse after clamping, with the magnitude actually charged against
/// the agent's budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedImpulse {
    /// Effective impulse vector, m/s
    pub dv: Vector3<f64>,

    /// Magnitude charged against the budget, m/s
    pub magnitude: f64,
}

impl ClampedImpulse {
    fn zero() -> Self {
        Self {
            dv: Vector3::zeros(),
            magnitude: 0.0,
        }
    }
}

/// Clamps a proposed impulse to the per-step cap and the remaining budget.
///
/// The magnitude clamp is applied first, the budget clamp second (the budget
/// may be smaller than the cap). Both rescale in place, preserving
/// direction; the zero vector maps to itself, and a zero budget always
/// yields the zero impulse. An over-limit request is not an error: the clamp
/// is silent and deterministic, and callers that want to observe it read
/// the charged magnitude from the result.
pub fn clamp_impulse(raw: Vector3<f64>, dv_step: f64, budget: f64) -> ClampedImpulse {
    let norm = raw.norm();
    if norm == 0.0 {
        return ClampedImpulse::zero();
    }

    let mut dv = raw;
    if norm > dv_step {
        dv *= dv_step / norm;
    }

    let norm = dv.norm();
    if norm > budget {
        dv *= budget / norm;
    }

    // The charged magnitude never exceeds either limit even when the
    // rescaled norm rounds a last-place unit high, so the budget
    // subtraction cannot round below zero.
    ClampedImpulse {
        dv,
        magnitude: dv.norm().min(dv_step).min(budget),
    }
}

/// Per-agent action space: a box-bounded 3-vector of impulse components,
/// each in `[-dv_step, +dv_step]` m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSpace {
    pub low: f64,
    pub high: f64,
}

impl ActionSpace {
    /// Number of action components.
    pub const DIM: usize = 3;

    /// Builds the space for a given per-step impulse cap.
    pub fn new(dv_step: f64) -> Self {
        Self {
            low: -dv_step,
            high: dv_step,
        }
    }

    /// Returns true when every component lies within the box.
    pub fn contains(&self, action: &Vector3<f64>) -> bool {
        action.iter().all(|c| self.low <= *c && *c <= self.high)
    }
}

/// Per-agent observation space: the agent's own Cartesian state, an
/// unbounded 6-vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationSpace {
    pub low: f64,
    pub high: f64,
}

impl ObservationSpace {
    /// Number of observation components.
    pub const DIM: usize = 6;

    pub fn new() -> Self {
        Self {
            low: f64::NEG_INFINITY,
            high: f64::INFINITY,
        }
    }
}

impl Default for ObservationSpace {
    fn default() -> Self {
        Self::new()
    }
}
