//! Closed-form two-body propagation.
//!
//! Analytic Keplerian motion: a state is converted to classical elements,
//! the mean anomaly is advanced by `n·dt`, Kepler's equation is solved for
//! the new eccentric anomaly, and the result is converted back. No numerical
//! integration and no perturbation forces; higher-fidelity engines plug in
//! through the [`Propagator`] trait instead.

use std::f64::consts::{PI, TAU};

use nalgebra::{Rotation3, Vector3};

use crate::elements::ClassicalElements;
use crate::epoch::Epoch;
use crate::error::DynamicsError;
use crate::propagator::{DynamicsConfig, Propagator};
use crate::state::CartesianState;

/// Angular threshold below which an orbit is treated as circular/equatorial.
const SMALL: f64 = 1e-10;

/// Newton iteration cap for Kepler's equation.
const MAX_KEPLER_ITER: usize = 50;

/// Convergence tolerance on eccentric anomaly, rad.
const KEPLER_TOL: f64 = 1e-12;

/// Analytic two-body propagator for elliptic orbits.
///
/// Deterministic and side-effect free; a single instance may be shared
/// between episode controllers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoBodyPropagator;

impl TwoBodyPropagator {
    pub fn new() -> Self {
        Self
    }
}

impl Propagator for TwoBodyPropagator {
    fn elements_to_state(
        &self,
        elements: &ClassicalElements,
        config: &DynamicsConfig,
    ) -> Result<CartesianState, DynamicsError> {
        if !elements.is_finite() {
            return Err(DynamicsError::non_finite(format!("elements {elements:?}")));
        }
        if elements.sma <= 0.0 || elements.ecc < 0.0 || elements.ecc >= 1.0 {
            return Err(DynamicsError::unsupported(format!(
                "elliptic orbit required (sma = {} m, ecc = {})",
                elements.sma, elements.ecc
            )));
        }

        let ta = elements.true_anomaly;
        let p = elements.sma * (1.0 - elements.ecc * elements.ecc);
        let r = p / (1.0 + elements.ecc * ta.cos());

        // Perifocal frame: x toward perigee, z along angular momentum.
        let r_pqw = Vector3::new(r * ta.cos(), r * ta.sin(), 0.0);
        let v_pqw = (config.mu / p).sqrt()
            * Vector3::new(-ta.sin(), elements.ecc + ta.cos(), 0.0);

        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), elements.raan)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), elements.inc)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), elements.argp);

        Ok(CartesianState::new(rot * r_pqw, rot * v_pqw))
    }

    fn state_to_elements(
        &self,
        state: &CartesianState,
        config: &DynamicsConfig,
    ) -> Result<ClassicalElements, DynamicsError> {
        if !state.is_finite() {
            return Err(DynamicsError::non_finite(format!("state {state:?}")));
        }

        let r = state.position;
        let v = state.velocity;
        let rn = r.norm();
        let v2 = v.norm_squared();
        if rn == 0.0 {
            return Err(DynamicsError::unsupported("zero-radius state"));
        }

        let h = r.cross(&v);
        let hn = h.norm();
        if hn == 0.0 {
            return Err(DynamicsError::unsupported("rectilinear trajectory (h = 0)"));
        }

        let node = Vector3::z().cross(&h);
        let nn = node.norm();

        let e_vec = ((v2 - config.mu / rn) * r - r.dot(&v) * v) / config.mu;
        let ecc = e_vec.norm();

        let energy = 0.5 * v2 - config.mu / rn;
        if energy >= 0.0 {
            return Err(DynamicsError::unsupported(format!(
                "non-elliptic orbit (specific energy = {energy} m^2/s^2)"
            )));
        }
        let sma = -config.mu / (2.0 * energy);

        let inc = (h.z / hn).clamp(-1.0, 1.0).acos();
        let equatorial = nn < SMALL * hn;
        let circular = ecc < SMALL;

        let raan = if equatorial {
            0.0
        } else {
            let mut raan = (node.x / nn).clamp(-1.0, 1.0).acos();
            if node.y < 0.0 {
                raan = TAU - raan;
            }
            raan
        };

        let argp = if circular {
            0.0
        } else if equatorial {
            // Longitude of perigee, measured from +x in the orbit plane.
            e_vec.y.atan2(e_vec.x).rem_euclid(TAU)
        } else {
            let mut argp = (node.dot(&e_vec) / (nn * ecc)).clamp(-1.0, 1.0).acos();
            if e_vec.z < 0.0 {
                argp = TAU - argp;
            }
            argp
        };

        let true_anomaly = if circular && equatorial {
            // True longitude stands in for the anomaly.
            let mut lambda = (r.x / rn).clamp(-1.0, 1.0).acos();
            if r.y < 0.0 {
                lambda = TAU - lambda;
            }
            lambda
        } else if circular {
            // Argument of latitude, measured from the ascending node.
            let mut u = (node.dot(&r) / (nn * rn)).clamp(-1.0, 1.0).acos();
            if r.z < 0.0 {
                u = TAU - u;
            }
            u
        } else {
            let mut ta = (e_vec.dot(&r) / (ecc * rn)).clamp(-1.0, 1.0).acos();
            if r.dot(&v) < 0.0 {
                ta = TAU - ta;
            }
            ta
        };

        Ok(ClassicalElements {
            sma,
            ecc,
            inc,
            raan,
            argp,
            true_anomaly,
        })
    }

    fn propagate(
        &self,
        epoch: Epoch,
        state: &CartesianState,
        dt_secs: f64,
        config: &DynamicsConfig,
    ) -> Result<(Epoch, CartesianState), DynamicsError> {
        if !dt_secs.is_finite() {
            return Err(DynamicsError::non_finite(format!("time step {dt_secs}")));
        }

        let coe = self.state_to_elements(state, config)?;

        let n = (config.mu / coe.sma.powi(3)).sqrt();
        let ea0 = eccentric_from_true(coe.true_anomaly, coe.ecc);
        let m0 = ea0 - coe.ecc * ea0.sin();
        let m1 = (m0 + n * dt_secs).rem_euclid(TAU);

        let ea1 = solve_kepler(m1, coe.ecc)?;
        let ta1 = true_from_eccentric(ea1, coe.ecc);

        let next = self.elements_to_state(&coe.at_true_anomaly(ta1), config)?;
        Ok((epoch.advance(dt_secs), next))
    }
}

/// Eccentric anomaly from true anomaly.
fn eccentric_from_true(ta: f64, ecc: f64) -> f64 {
    ((1.0 - ecc * ecc).sqrt() * ta.sin()).atan2(ecc + ta.cos())
}

/// True anomaly from eccentric anomaly.
fn true_from_eccentric(ea: f64, ecc: f64) -> f64 {
    ((1.0 - ecc * ecc).sqrt() * ea.sin()).atan2(ea.cos() - ecc)
}

/// Solves Kepler's equation `M = E - e sin E` for E by Newton iteration.
fn solve_kepler(m: f64, ecc: f64) -> Result<f64, DynamicsError> {
    // The flat initial guess stalls near perigee for highly eccentric orbits.
    let mut ea = if ecc < 0.8 { m } else { PI };

    for _ in 0..MAX_KEPLER_ITER {
        let f = ea - ecc * ea.sin() - m;
        let fp = 1.0 - ecc * ea.cos();
        let delta = f / fp;
        ea -= delta;
        if delta.abs() < KEPLER_TOL {
            return Ok(ea);
        }
    }

    Err(DynamicsError::NoConvergence(MAX_KEPLER_ITER))
}
