//! # Voxtrack
//!
//! Bounded route planning for agents walking through a voxel world.
//!
//! ## Architecture Overview
//!
//! The crate is split into three layers:
//!
//! - **World**: Voxel coordinates, the occupancy oracle abstraction, a sparse
//!   in-memory grid, ground snapping and a procedural terrain generator
//! - **Planning**: Budgeted A* search over walkable voxels, path
//!   reconstruction and simplification, fallback guidance and arc-length
//!   resampling
//! - **Tracker**: Ties the pieces together for "guide this agent to that
//!   one", degrading to fallback guidance when no route can be planned
//!
//! The planner never mutates the world and holds no state between requests,
//! so one oracle may be shared by many planners across threads.

pub mod planning;
pub mod tracker;
pub mod world;

pub use planning::*;
pub use tracker::*;
pub use world::*;

/// Core error type for Voxtrack.
#[derive(thiserror::Error, Debug)]
pub enum VoxtrackError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Request carries unusable input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// World description cannot be loaded
    #[error("Invalid world: {0}")]
    InvalidWorld(String),
}

/// Result type used throughout the Voxtrack codebase.
pub type VoxtrackResult<T> = Result<T, VoxtrackError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Planner configuration defaults.
pub mod config {
    /// Distance from the goal at which a route counts as arrived
    pub const DEFAULT_ACCEPTANCE_RADIUS: f64 = 2.0;

    /// Node expansions allowed per search
    pub const DEFAULT_MAX_ITERATIONS: usize = 5_000;

    /// Longest voxel distance the planner will attempt
    pub const DEFAULT_MAX_PATH_LENGTH: f64 = 200.0;

    /// Largest vertical change in a single move
    pub const DEFAULT_STEP_HEIGHT: i32 = 1;

    /// Open voxels an agent needs above its footing
    pub const DEFAULT_AGENT_CLEARANCE: i32 = 2;

    /// Height of a waypoint above the floor of its voxel
    pub const DEFAULT_STAND_HEIGHT: f64 = 1.0;

    /// Tolerance used when merging collinear waypoints
    pub const DEFAULT_SIMPLIFY_EPSILON: f64 = 0.1;

    /// Spacing between straight-line fallback samples
    pub const DEFAULT_LINE_SPACING: f64 = 2.0;

    /// Horizontal offset of a direction hint from the agent
    pub const DEFAULT_HINT_DISTANCE: f64 = 2.0;

    /// Vertical offset of a direction hint from the agent
    pub const DEFAULT_HINT_HEIGHT: f64 = 1.5;

    /// Below this distance no guidance is produced
    pub const DEFAULT_ARRIVAL_THRESHOLD: f64 = 1.0;

    /// Ground scans start this far above the target
    pub const DEFAULT_GROUND_SCAN_LIFT: f64 = 10.0;

    /// Voxels examined by a ground scan
    pub const DEFAULT_GROUND_SCAN_DEPTH: u32 = 64;

    /// Spacing of route markers
    pub const DEFAULT_MARKER_SPACING: f64 = 1.5;

    /// Spacing of animated markers
    pub const ANIMATED_MARKER_SPACING: f64 = 1.0;

    /// Upper bound on markers shown for one route
    pub const MAX_MARKERS: usize = 50;
}
