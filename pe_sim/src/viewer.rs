//! Rerun visualization for episodes.
//!
//! Logs per-agent positions and bounded-history trajectory trails to a
//! Rerun viewer. Only available with the `visualization` feature; without
//! it the viewer compiles to a disabled no-op, so rollout code can drive it
//! unconditionally.

use std::collections::{HashMap, VecDeque};

use pe_core::{AgentId, DisplaySink};
#[cfg(feature = "visualization")]
use pe_core::Role;
use pe_dynamics::CartesianState;

#[cfg(feature = "visualization")]
use rerun::{Color, LineStrips3D, Points3D, Radius, RecordingStream};

/// Frames of trail history kept per agent.
const DEFAULT_MAX_HISTORY: usize = 60;

/// Rerun-backed display sink.
pub struct RerunViewer {
    #[cfg(feature = "visualization")]
    rec: Option<RecordingStream>,

    /// Whether a viewer is actually connected
    enabled: bool,

    /// Trail length cap, frames
    max_history: usize,

    /// Recent positions per agent, newest last
    trails: HashMap<AgentId, VecDeque<[f32; 3]>>,

    /// Frames received since the last reset
    frame_count: i64,
}

impl RerunViewer {
    /// Creates a viewer that renders nothing.
    pub fn disabled() -> Self {
        Self {
            #[cfg(feature = "visualization")]
            rec: None,
            enabled: false,
            max_history: DEFAULT_MAX_HISTORY,
            trails: HashMap::new(),
            frame_count: 0,
        }
    }

    /// Creates a viewer that spawns the Rerun application.
    #[cfg(feature = "visualization")]
    pub fn new(name: &str) -> Self {
        match rerun::RecordingStreamBuilder::new(name).spawn() {
            Ok(rec) => {
                tracing::info!("Rerun visualization enabled - open the Rerun viewer to watch");
                Self {
                    rec: Some(rec),
                    enabled: true,
                    max_history: DEFAULT_MAX_HISTORY,
                    trails: HashMap::new(),
                    frame_count: 0,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Rerun: {:?}", e);
                Self::disabled()
            }
        }
    }

    /// Creates a viewer - disabled when the feature is not compiled in.
    #[cfg(not(feature = "visualization"))]
    pub fn new(_name: &str) -> Self {
        tracing::info!("Rerun visualization not available (compile with --features visualization)");
        Self::disabled()
    }

    /// Returns whether a viewer is connected.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn push_trail(&mut self, agent: AgentId, state: &CartesianState) {
        let trail = self.trails.entry(agent).or_default();
        trail.push_back([
            state.position.x as f32,
            state.position.y as f32,
            state.position.z as f32,
        ]);
        while trail.len() > self.max_history {
            trail.pop_front();
        }
    }

    #[cfg(feature = "visualization")]
    fn agent_color(agent: AgentId) -> Color {
        match agent.role {
            Role::Pursuer => Color::from_rgb(255, 100, 100), // Red
            Role::Evader => Color::from_rgb(100, 100, 255),  // Blue
        }
    }

    #[cfg(feature = "visualization")]
    fn log_agents(&self) {
        let Some(rec) = &self.rec else { return };
        rec.set_time_sequence("frame", self.frame_count);

        for (agent, trail) in &self.trails {
            let Some(current) = trail.back() else { continue };
            let color = Self::agent_color(*agent);

            let _ = rec.log(
                format!("world/agents/{agent}/position"),
                &Points3D::new([*current])
                    .with_colors([color])
                    .with_radii([Radius::new_scene_units(2.0e5)]),
            );

            if trail.len() > 1 {
                let strip: Vec<[f32; 3]> = trail.iter().copied().collect();
                let _ = rec.log(
                    format!("world/agents/{agent}/trail"),
                    &LineStrips3D::new([strip])
                        .with_colors([color])
                        .with_radii([Radius::new_scene_units(5.0e4)]),
                );
            }
        }
    }

    #[cfg(not(feature = "visualization"))]
    fn log_agents(&self) {}
}

impl DisplaySink for RerunViewer {
    fn update(&mut self, snapshot: &HashMap<AgentId, CartesianState>) {
        self.frame_count += 1;
        for (agent, state) in snapshot {
            self.push_trail(*agent, state);
        }
        self.log_agents();
    }

    fn reset(&mut self) {
        self.trails.clear();
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn snapshot(x: f64) -> HashMap<AgentId, CartesianState> {
        let mut map = HashMap::new();
        map.insert(
            AgentId::pursuer(0),
            CartesianState::new(Vector3::new(x, 0.0, 0.0), Vector3::zeros()),
        );
        map
    }

    #[test]
    fn test_trail_history_is_bounded() {
        let mut viewer = RerunViewer::disabled();

        for i in 0..(DEFAULT_MAX_HISTORY + 20) {
            viewer.update(&snapshot(i as f64));
        }

        let trail = &viewer.trails[&AgentId::pursuer(0)];
        assert_eq!(trail.len(), DEFAULT_MAX_HISTORY);
        // Oldest frames were dropped, newest kept.
        assert_eq!(trail.back().unwrap()[0], (DEFAULT_MAX_HISTORY + 19) as f32);
    }

    #[test]
    fn test_reset_clears_trails() {
        let mut viewer = RerunViewer::disabled();
        viewer.update(&snapshot(1.0));
        assert!(!viewer.trails.is_empty());

        viewer.reset();
        assert!(viewer.trails.is_empty());
        assert_eq!(viewer.frame_count, 0);
    }
}
