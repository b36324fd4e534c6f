//! # Voxtrack Command Line Entry Point
//!
//! Loads or generates a voxel world, plans guidance between two points and
//! prints the outcome as JSON.

use clap::{Parser, ValueEnum};
#[cfg(not(feature = "dev-tools"))]
use log::{error, info};
use serde::Serialize;
use std::path::PathBuf;
#[cfg(feature = "dev-tools")]
use tracing::{error, info};
use voxtrack::{
    config, new_agent_id, FallbackMode, RouteOutcome, RouteTracker, SparseVoxelGrid,
    TerrainConfig, TerrainGenerator, TrackerConfig, Vec3, VoxtrackError, VoxtrackResult,
};

/// Guidance requested on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Walkable route, falling back to a direction hint
    Route,
    /// Walkable route, falling back to a straight line
    Line,
    /// Direction hint only
    Hint,
}

/// Command line arguments for Voxtrack.
#[derive(Parser, Debug)]
#[command(name = "voxtrack")]
#[command(about = "Plan walkable routes through a voxel world")]
#[command(version)]
struct Args {
    /// World snapshot file (JSON)
    #[arg(short, long, conflicts_with = "terrain_seed")]
    world: Option<PathBuf>,

    /// Generate terrain from this seed instead of loading a world
    #[arg(long)]
    terrain_seed: Option<u64>,

    /// Start position as x,y,z
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    start: Vec3,

    /// End position as x,y,z
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    end: Vec3,

    /// Kind of guidance to produce
    #[arg(long, value_enum, default_value = "route")]
    mode: Mode,

    /// Tracker configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Marker spacing; markers are omitted when not given
    #[arg(long)]
    spacing: Option<f64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// What gets printed for one run.
#[derive(Serialize)]
struct Report<'a> {
    outcome: &'a RouteOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    markers: Option<Vec<Vec3>>,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .target(env_logger::Target::Stderr)
            .init();
    }
}

fn run(args: &Args) -> VoxtrackResult<()> {
    info!("Starting Voxtrack v{}", voxtrack::VERSION);

    let tracker_config = match &args.config {
        Some(path) => TrackerConfig::load_from_file(path)?,
        None => TrackerConfig::default(),
    };
    let tracker = RouteTracker::new(tracker_config)?;

    let fallback_mode = match args.mode {
        Mode::Route | Mode::Hint => FallbackMode::DirectionHint,
        Mode::Line => FallbackMode::StraightLine,
    };

    let agent = new_agent_id();
    let outcome = if args.mode == Mode::Hint {
        tracker.fallback_only(agent, args.start, args.end, fallback_mode)?
    } else {
        let world = load_world(args)?;
        tracker.route(&world, agent, args.start, args.end, fallback_mode)?
    };

    match outcome.failure {
        Some(failure) => info!("No route ({}), using fallback guidance", failure),
        None if args.mode == Mode::Hint => info!("Direction hint only, no world consulted"),
        None => info!(
            "Planned in {} iterations, {} nodes",
            outcome.stats.iterations, outcome.stats.nodes_created
        ),
    }

    let markers = match args.spacing {
        Some(spacing) => Some(outcome.markers(spacing, config::MAX_MARKERS)?),
        None => None,
    };

    let report = Report {
        outcome: &outcome,
        markers,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_world(args: &Args) -> VoxtrackResult<SparseVoxelGrid> {
    if let Some(path) = &args.world {
        info!("Loading world from {}", path.display());
        return SparseVoxelGrid::load_from_file(path);
    }

    let seed = args.terrain_seed.unwrap_or(12345);
    info!("Generating terrain with seed: {}", seed);
    TerrainGenerator::new().generate(&TerrainConfig::new(seed))
}

/// Parses `x,y,z` into a point.
fn parse_point(s: &str) -> Result<Vec3, VoxtrackError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(VoxtrackError::InvalidRequest(format!(
            "expected x,y,z but got '{}'",
            s
        )));
    };

    let parse = |v: &str| {
        v.parse::<f64>()
            .map_err(|e| VoxtrackError::InvalidRequest(format!("bad coordinate '{}': {}", v, e)))
    };
    Ok(Vec3::new(parse(*x)?, parse(*y)?, parse(*z)?))
}
