//! Episode configuration.

use pe_dynamics::{ClassicalElements, DynamicsConfig, Epoch};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::EpisodeError;

/// The shared orbit both agents start on, phase excluded.
///
/// At reset the two agents receive the same semi-major axis, eccentricity,
/// inclination, node and perigee, and differ only in true anomaly: two
/// co-planar, same-size orbits at different phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrbit {
    /// Semi-major axis, m
    pub sma: f64,

    /// Eccentricity
    pub ecc: f64,

    /// Inclination, rad
    pub inc: f64,

    /// Right ascension of the ascending node, rad
    pub raan: f64,

    /// Argument of perigee, rad
    pub argp: f64,
}

impl ReferenceOrbit {
    /// Returns the full element set at the given true anomaly.
    pub fn elements_at(&self, true_anomaly: f64) -> ClassicalElements {
        ClassicalElements {
            sma: self.sma,
            ecc: self.ecc,
            inc: self.inc,
            raan: self.raan,
            argp: self.argp,
            true_anomaly,
        }
    }
}

impl Default for ReferenceOrbit {
    /// Circular equatorial geostationary-altitude orbit.
    fn default() -> Self {
        Self {
            sma: 42_166_300.0,
            ecc: 0.0,
            inc: 0.0,
            raan: 0.0,
            argp: 0.0,
        }
    }
}

/// Immutable per-episode parameters.
///
/// Created once at episode construction and never mutated during an episode;
/// build a new controller to change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Number of pursuers (only 1 is supported)
    pub num_pursuers: usize,

    /// Number of evaders (only 1 is supported)
    pub num_evaders: usize,

    /// Epoch at episode start
    pub init_epoch: Epoch,

    /// Initial delta-v budget per agent, m/s
    pub initial_dv: f64,

    /// Pursuer-evader distance below which capture succeeds, m
    pub capture_radius: f64,

    /// Episode time budget; elapsed time at or past this truncates, s
    pub episode_length: f64,

    /// Simulated time advanced per step, s
    pub step_interval: f64,

    /// Maximum impulse magnitude per step, m/s
    pub dv_step: f64,

    /// Orbit both agents are seeded on
    pub reference_orbit: ReferenceOrbit,

    /// Half-width of the uniform phase offset drawn between the reference
    /// anomaly, the evader and the pursuer at reset, rad
    pub phase_jitter: f64,

    /// When set, capture additionally requires pursuer-evader relative
    /// speed below this threshold, m/s
    pub capture_speed: Option<f64>,

    /// When set, the episode terminates once every pursuer's budget is
    /// exhausted
    pub end_on_dv_exhaustion: bool,

    /// Dynamics configuration handed to every propagation call
    pub dynamics: DynamicsConfig,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            num_pursuers: 1,
            num_evaders: 1,
            init_epoch: Epoch::from_ymd_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            initial_dv: 100.0,
            capture_radius: 30.0e3,
            episode_length: 3600.0,
            step_interval: 60.0,
            dv_step: 1.0,
            reference_orbit: ReferenceOrbit::default(),
            phase_jitter: 0.5,
            capture_speed: None,
            end_on_dv_exhaustion: false,
            dynamics: DynamicsConfig::default(),
        }
    }
}

impl EpisodeConfig {
    /// All agent ids in stable order: pursuers first, then evaders.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        let mut ids = Vec::with_capacity(self.num_pursuers + self.num_evaders);
        ids.extend((0..self.num_pursuers).map(|i| AgentId::pursuer(i as u16)));
        ids.extend((0..self.num_evaders).map(|i| AgentId::evader(i as u16)));
        ids
    }

    /// Checks the configuration; a controller refuses to build on error.
    pub fn validate(&self) -> Result<(), EpisodeError> {
        if self.num_pursuers != 1 || self.num_evaders != 1 {
            return Err(EpisodeError::configuration(format!(
                "exactly one pursuer and one evader are supported, got {}v{}",
                self.num_pursuers, self.num_evaders
            )));
        }
        if !(self.dv_step > 0.0 && self.dv_step.is_finite()) {
            return Err(EpisodeError::configuration(format!(
                "per-step impulse cap must be positive, got {}",
                self.dv_step
            )));
        }
        if !(self.initial_dv > 0.0 && self.initial_dv.is_finite()) {
            return Err(EpisodeError::configuration(format!(
                "initial delta-v budget must be positive, got {}",
                self.initial_dv
            )));
        }
        if !(self.step_interval > 0.0 && self.step_interval.is_finite()) {
            return Err(EpisodeError::configuration(format!(
                "step interval must be positive, got {}",
                self.step_interval
            )));
        }
        if !(self.episode_length > 0.0 && self.episode_length.is_finite()) {
            return Err(EpisodeError::configuration(format!(
                "episode length must be positive, got {}",
                self.episode_length
            )));
        }
        if !(self.capture_radius > 0.0 && self.capture_radius.is_finite()) {
            return Err(EpisodeError::configuration(format!(
                "capture radius must be positive, got {}",
                self.capture_radius
            )));
        }
        if !(self.phase_jitter > 0.0 && self.phase_jitter.is_finite()) {
            return Err(EpisodeError::configuration(format!(
                "phase jitter must be positive, got {}",
                self.phase_jitter
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EpisodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_agent_ids_order() {
        let ids = EpisodeConfig::default().agent_ids();
        assert_eq!(ids, vec![AgentId::pursuer(0), AgentId::evader(0)]);
    }

    #[test]
    fn test_non_1v1_rejected() {
        let config = EpisodeConfig {
            num_pursuers: 2,
            ..EpisodeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EpisodeError::Configuration(_))
        ));

        let config = EpisodeConfig {
            num_evaders: 0,
            ..EpisodeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_limits_rejected() {
        let mutations: [fn(&mut EpisodeConfig); 6] = [
            |c| c.dv_step = 0.0,
            |c| c.initial_dv = -1.0,
            |c| c.step_interval = 0.0,
            |c| c.episode_length = f64::NAN,
            |c| c.capture_radius = -5.0,
            |c| c.phase_jitter = 0.0,
        ];
        for mutate in mutations {
            let mut config = EpisodeConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err());
        }
    }
}
