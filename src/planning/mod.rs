//! # Planning Module
//!
//! Bounded route search over voxel terrain and the post-processing that turns
//! its output into something a presentation or autopilot layer can consume.
//!
//! The pipeline is:
//! - [`Planner`] searches for a walkable route between two points
//! - [`reconstruct`] and [`simplify`] turn the raw search tree into waypoints
//! - [`fallback`] produces a straight line or direction hint when search fails
//! - [`resample`] re-spaces waypoints for fixed-rate consumers

pub mod fallback;
pub mod path;
pub mod resample;
pub mod search;

pub use fallback::*;
pub use path::*;
pub use resample::*;
pub use search::*;

use crate::world::{Vec3, VoxelCoord, VOXEL_LIMIT};
use crate::{config, VoxtrackError, VoxtrackResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the agent a planning request is made on behalf of.
pub type AgentId = Uuid;

/// Creates a new unique agent ID.
pub fn new_agent_id() -> AgentId {
    Uuid::new_v4()
}

/// Tuning for the search engine and path post-processing.
///
/// # Examples
///
/// ```
/// use voxtrack::PlanningConfig;
///
/// let config = PlanningConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.step_height, 1);
/// assert_eq!(config.agent_clearance, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Distance from the goal at which a node counts as arrived
    pub acceptance_radius: f64,
    /// Maximum number of node expansions per call
    pub max_iterations: usize,
    /// Straight-line distance beyond which no search is attempted
    pub max_path_length: f64,
    /// Largest vertical change allowed in a single move
    pub step_height: i32,
    /// Number of open voxels the agent needs above its footing
    pub agent_clearance: i32,
    /// Height above the voxel floor at which waypoints are placed
    pub stand_height: f64,
    /// Per-axis tolerance used when collapsing colinear waypoints
    pub simplify_epsilon: f64,
}

impl PlanningConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            acceptance_radius: config::DEFAULT_ACCEPTANCE_RADIUS,
            max_iterations: config::DEFAULT_MAX_ITERATIONS,
            max_path_length: config::DEFAULT_MAX_PATH_LENGTH,
            step_height: config::DEFAULT_STEP_HEIGHT,
            agent_clearance: config::DEFAULT_AGENT_CLEARANCE,
            stand_height: config::DEFAULT_STAND_HEIGHT,
            simplify_epsilon: config::DEFAULT_SIMPLIFY_EPSILON,
        }
    }

    /// Creates a configuration with a tight acceptance radius and small
    /// budgets, so test scenarios end exactly where expected.
    pub fn for_testing() -> Self {
        Self {
            acceptance_radius: 1.0,
            max_iterations: 2_000,
            max_path_length: 64.0,
            ..Self::new()
        }
    }

    /// Checks that every parameter is usable.
    pub fn validate(&self) -> VoxtrackResult<()> {
        if !(self.acceptance_radius.is_finite() && self.acceptance_radius > 0.0) {
            return Err(VoxtrackError::InvalidConfig(format!(
                "acceptance radius must be positive, got {}",
                self.acceptance_radius
            )));
        }
        if self.max_iterations == 0 {
            return Err(VoxtrackError::InvalidConfig(
                "max iterations must be at least 1".to_string(),
            ));
        }
        if !(self.max_path_length.is_finite() && self.max_path_length >= 0.0) {
            return Err(VoxtrackError::InvalidConfig(format!(
                "max path length must be a non-negative number, got {}",
                self.max_path_length
            )));
        }
        if self.step_height < 0 {
            return Err(VoxtrackError::InvalidConfig(format!(
                "step height must not be negative, got {}",
                self.step_height
            )));
        }
        if self.agent_clearance < 1 {
            return Err(VoxtrackError::InvalidConfig(format!(
                "agent clearance must be at least 1 voxel, got {}",
                self.agent_clearance
            )));
        }
        if !self.stand_height.is_finite() {
            return Err(VoxtrackError::InvalidConfig(
                "stand height must be finite".to_string(),
            ));
        }
        if !(self.simplify_epsilon.is_finite() && self.simplify_epsilon >= 0.0) {
            return Err(VoxtrackError::InvalidConfig(format!(
                "simplify epsilon must be a non-negative number, got {}",
                self.simplify_epsilon
            )));
        }
        Ok(())
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A single route query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    /// Agent the route is planned for
    pub agent: AgentId,
    /// Where the agent currently stands
    pub start: Vec3,
    /// Where the agent wants to go
    pub end: Vec3,
    /// Search and post-processing parameters
    pub config: PlanningConfig,
}

impl PlanningRequest {
    /// Creates a request with the default configuration.
    pub fn new(agent: AgentId, start: Vec3, end: Vec3) -> Self {
        Self {
            agent,
            start,
            end,
            config: PlanningConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: PlanningConfig) -> Self {
        self.config = config;
        self
    }

    /// Rejects non-finite endpoints and unusable configurations.
    pub fn validate(&self) -> VoxtrackResult<()> {
        if !self.start.is_finite() {
            return Err(VoxtrackError::InvalidRequest(format!(
                "start position {:?} is not finite",
                self.start
            )));
        }
        if !self.end.is_finite() {
            return Err(VoxtrackError::InvalidRequest(format!(
                "end position {:?} is not finite",
                self.end
            )));
        }
        self.config.validate()
    }

    /// Voxels holding the start and end, or `InvalidRequest` when either
    /// lies beyond [`VOXEL_LIMIT`] on some axis.
    pub fn voxels(&self) -> VoxtrackResult<(VoxelCoord, VoxelCoord)> {
        let locate = |label: &str, point: Vec3| {
            VoxelCoord::try_from_point(point).ok_or_else(|| {
                VoxtrackError::InvalidRequest(format!(
                    "{} position {} lies outside ±{} voxels",
                    label, point, VOXEL_LIMIT
                ))
            })
        };
        Ok((locate("start", self.start)?, locate("end", self.end)?))
    }
}

/// Why a search ended without reaching the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotFoundReason {
    /// The iteration budget ran out with nodes still on the frontier
    SearchExhausted,
    /// Every reachable node was expanded without arriving
    NoPathFound,
}

/// Outcome of a single planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanningResult {
    /// A walkable route; raw, one waypoint per voxel step
    Found(Path),
    /// The search ran and failed
    NotFound(NotFoundReason),
    /// Endpoints were too far apart to attempt a search
    DistanceExceeded { distance: f64, limit: f64 },
}

impl PlanningResult {
    /// Whether a route was found.
    pub fn is_found(&self) -> bool {
        matches!(self, PlanningResult::Found(_))
    }

    /// The route, if one was found.
    pub fn path(&self) -> Option<&Path> {
        match self {
            PlanningResult::Found(path) => Some(path),
            _ => None,
        }
    }

    /// Consumes the result, yielding the route if one was found.
    pub fn into_path(self) -> Option<Path> {
        match self {
            PlanningResult::Found(path) => Some(path),
            _ => None,
        }
    }
}
