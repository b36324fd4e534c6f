//! # Tracker Module
//!
//! Turns "guide this agent to that one" into guidance a consumer can show or
//! follow. A walkable route is preferred; when none can be produced the
//! tracker degrades to fallback guidance instead of failing.
//!
//! Agent identity is always explicit: callers pass the requesting agent and
//! the candidate targets, and nothing is looked up from shared state.

use crate::planning::{
    fallback, resample, simplify_with_epsilon, AgentId, DirectionHint, Fallback, FallbackConfig,
    FallbackMode, NotFoundReason, Path, Planner, PlanningConfig, PlanningRequest, PlanningResult,
    SearchStats,
};
use crate::world::{find_ground_level, OccupancyOracle, Vec3};
use crate::{config, VoxtrackError, VoxtrackResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

/// Why the tracker fell back instead of returning a walkable route.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteFailure {
    /// Target is further away than the planner will search
    #[error("target is beyond the maximum route length")]
    DistanceExceeded,

    /// Search budget ran out before reaching the target
    #[error("search budget exhausted before reaching the target")]
    SearchExhausted,

    /// Every reachable voxel was explored without reaching the target
    #[error("no walkable route to the target")]
    NoPathFound,

    /// Terrain could not be read at all
    #[error("world occupancy is unavailable")]
    OracleUnavailable,
}

impl From<NotFoundReason> for RouteFailure {
    fn from(reason: NotFoundReason) -> Self {
        match reason {
            NotFoundReason::SearchExhausted => RouteFailure::SearchExhausted,
            NotFoundReason::NoPathFound => RouteFailure::NoPathFound,
        }
    }
}

/// What the consumer should present or follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Guidance {
    /// Target is already within reach
    Arrived,
    /// Simplified walkable route
    Route(Path),
    /// Straight-line fallback samples
    Line(Path),
    /// Single direction marker fallback
    Hint(DirectionHint),
}

impl Guidance {
    /// Whether this guidance is a walkable route.
    pub fn is_route(&self) -> bool {
        matches!(self, Guidance::Route(_))
    }
}

impl From<Fallback> for Guidance {
    fn from(fallback: Fallback) -> Self {
        match fallback {
            Fallback::Arrived => Guidance::Arrived,
            Fallback::Line(path) => Guidance::Line(path),
            Fallback::Hint(hint) => Guidance::Hint(hint),
        }
    }
}

/// Everything the tracker decided for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOutcome {
    /// Agent the guidance is for
    pub agent: AgentId,
    /// Guidance to present
    pub guidance: Guidance,
    /// Why routing failed, when it did
    pub failure: Option<RouteFailure>,
    /// Goal actually searched for, after ground snapping
    pub target: Vec3,
    /// Waypoints in the route before simplification
    pub raw_waypoints: usize,
    /// Search work performed
    pub stats: SearchStats,
}

impl RouteOutcome {
    fn new(agent: AgentId, guidance: Guidance, target: Vec3) -> Self {
        Self {
            agent,
            guidance,
            failure: None,
            target,
            raw_waypoints: 0,
            stats: SearchStats::default(),
        }
    }

    /// Evenly spaced marker positions for fixed-rate presentation.
    ///
    /// Routes and lines are resampled by arc length; a hint yields its single
    /// position; arrival yields nothing.
    pub fn markers(&self, spacing: f64, max_points: usize) -> VoxtrackResult<Vec<Vec3>> {
        match &self.guidance {
            Guidance::Arrived => Ok(Vec::new()),
            Guidance::Route(path) | Guidance::Line(path) => resample(path, spacing, max_points),
            Guidance::Hint(hint) => Ok(vec![hint.position]),
        }
    }
}

/// Tuning for the tracker as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Search parameters
    pub planning: PlanningConfig,
    /// Fallback parameters
    pub fallback: FallbackConfig,
    /// Plan to the ground under the target rather than the target itself
    pub snap_goal_to_ground: bool,
    /// How far above the target the ground scan starts
    pub ground_scan_lift: f64,
    /// How many voxels the ground scan examines
    pub ground_scan_depth: u32,
}

impl TrackerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            planning: PlanningConfig::new(),
            fallback: FallbackConfig::new(),
            snap_goal_to_ground: true,
            ground_scan_lift: config::DEFAULT_GROUND_SCAN_LIFT,
            ground_scan_depth: config::DEFAULT_GROUND_SCAN_DEPTH,
        }
    }

    /// Checks every nested configuration.
    pub fn validate(&self) -> VoxtrackResult<()> {
        self.planning.validate()?;
        self.fallback.validate()?;
        if !self.ground_scan_lift.is_finite() {
            return Err(VoxtrackError::InvalidConfig(
                "ground scan lift must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn load_from_file<P: AsRef<FsPath>>(path: P) -> VoxtrackResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Plans routes between agents and degrades to fallback guidance.
///
/// # Examples
///
/// ```
/// use voxtrack::{new_agent_id, FallbackMode, Guidance, RouteTracker, SparseVoxelGrid, Vec3};
///
/// // Nothing to stand on anywhere: the tracker still answers with a hint
/// let world = SparseVoxelGrid::unbounded();
/// let tracker = RouteTracker::default();
/// let outcome = tracker
///     .route(
///         &world,
///         new_agent_id(),
///         Vec3::new(0.0, 10.0, 0.0),
///         Vec3::new(20.0, 10.0, 0.0),
///         FallbackMode::DirectionHint,
///     )
///     .unwrap();
/// assert!(matches!(outcome.guidance, Guidance::Hint(_)));
/// assert!(outcome.failure.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTracker {
    config: TrackerConfig,
}

impl RouteTracker {
    /// Creates a tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> VoxtrackResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Produces guidance for `agent` from `start` toward `end`.
    ///
    /// Only non-finite positions are errors. Distance limits, exhausted
    /// searches, unreachable targets and an unavailable world all yield
    /// fallback guidance of the requested `mode`, with the reason recorded
    /// in [`RouteOutcome::failure`].
    pub fn route<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        agent: AgentId,
        start: Vec3,
        end: Vec3,
        mode: FallbackMode,
    ) -> VoxtrackResult<RouteOutcome> {
        if !start.is_finite() || !end.is_finite() {
            return Err(VoxtrackError::InvalidRequest(format!(
                "positions must be finite, got {:?} -> {:?}",
                start, end
            )));
        }

        if start.distance(end) < self.config.fallback.arrival_threshold {
            return Ok(RouteOutcome::new(agent, Guidance::Arrived, end));
        }

        if !oracle.is_available() {
            warn!("agent {}: world unavailable, using fallback guidance", agent);
            return Ok(self.degrade(agent, start, end, end, mode, RouteFailure::OracleUnavailable));
        }

        let target = if self.config.snap_goal_to_ground {
            let ground = find_ground_level(
                oracle,
                end.x,
                end.y + self.config.ground_scan_lift,
                end.z,
                self.config.ground_scan_depth,
            );
            Vec3::new(end.x, ground.unwrap_or(end.y), end.z)
        } else {
            end
        };

        let request = PlanningRequest::new(agent, start, target)
            .with_config(self.config.planning.clone());
        let (result, stats) = Planner::new(oracle).plan_with_stats(&request)?;

        let mut outcome = match result {
            PlanningResult::Found(raw) => {
                let route = simplify_with_epsilon(&raw, self.config.planning.simplify_epsilon);
                debug!(
                    "agent {}: route simplified from {} to {} waypoints",
                    agent,
                    raw.len(),
                    route.len()
                );
                let mut outcome = RouteOutcome::new(agent, Guidance::Route(route), target);
                outcome.raw_waypoints = raw.len();
                outcome
            }
            PlanningResult::NotFound(reason) => {
                self.degrade(agent, start, end, target, mode, reason.into())
            }
            PlanningResult::DistanceExceeded { distance, limit } => {
                debug!(
                    "agent {}: target {:.1} away exceeds limit {:.1}",
                    agent, distance, limit
                );
                self.degrade(agent, start, end, target, mode, RouteFailure::DistanceExceeded)
            }
        };
        outcome.stats = stats;
        Ok(outcome)
    }

    /// Produces fallback guidance without consulting any world.
    ///
    /// Nothing went wrong, so no [`RouteFailure`] is recorded. Start and end
    /// closer than the arrival threshold still yield [`Guidance::Arrived`].
    pub fn fallback_only(
        &self,
        agent: AgentId,
        start: Vec3,
        end: Vec3,
        mode: FallbackMode,
    ) -> VoxtrackResult<RouteOutcome> {
        if !start.is_finite() || !end.is_finite() {
            return Err(VoxtrackError::InvalidRequest(format!(
                "positions must be finite, got {:?} -> {:?}",
                start, end
            )));
        }

        let guidance = fallback(start, end, mode, &self.config.fallback).into();
        Ok(RouteOutcome::new(agent, guidance, end))
    }

    fn degrade(
        &self,
        agent: AgentId,
        start: Vec3,
        end: Vec3,
        target: Vec3,
        mode: FallbackMode,
        failure: RouteFailure,
    ) -> RouteOutcome {
        debug!("agent {}: falling back ({})", agent, failure);
        let guidance = fallback(start, end, mode, &self.config.fallback).into();
        let mut outcome = RouteOutcome::new(agent, guidance, target);
        outcome.failure = Some(failure);
        outcome
    }
}

/// An agent and where it currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPosition {
    pub agent: AgentId,
    pub position: Vec3,
}

impl AgentPosition {
    /// Creates a new agent position.
    pub fn new(agent: AgentId, position: Vec3) -> Self {
        Self { agent, position }
    }
}

/// Finds the candidate closest to `origin`, skipping the requester itself and
/// any candidate with a non-finite position.
///
/// # Examples
///
/// ```
/// use voxtrack::{nearest_target, new_agent_id, AgentPosition, Vec3};
///
/// let me = new_agent_id();
/// let near = AgentPosition::new(new_agent_id(), Vec3::new(3.0, 0.0, 0.0));
/// let far = AgentPosition::new(new_agent_id(), Vec3::new(30.0, 0.0, 0.0));
/// let myself = AgentPosition::new(me, Vec3::zero());
///
/// let candidates = [far, myself, near];
/// let found = nearest_target(me, Vec3::zero(), &candidates).unwrap();
/// assert_eq!(found.agent, near.agent);
/// ```
pub fn nearest_target(
    requester: AgentId,
    origin: Vec3,
    candidates: &[AgentPosition],
) -> Option<&AgentPosition> {
    candidates
        .iter()
        .filter(|c| c.agent != requester && c.position.is_finite())
        .min_by(|a, b| {
            origin
                .distance(a.position)
                .total_cmp(&origin.distance(b.position))
        })
}
