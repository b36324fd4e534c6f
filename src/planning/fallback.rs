//! # Fallback Planner
//!
//! Guidance for when no walkable route is available: either a straight line
//! of evenly spaced points toward the target, or a single hint placed a short
//! way ahead of the agent and oriented toward the target.

use super::Path;
use crate::config;
use crate::world::Vec3;
use serde::{Deserialize, Serialize};

/// What kind of fallback guidance the consumer can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackMode {
    /// Interpolated points from start to end
    StraightLine,
    /// One oriented point just ahead of the start
    DirectionHint,
}

/// Tuning for fallback guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Distance between straight-line samples
    pub line_spacing: f64,
    /// Horizontal distance of the hint in front of the start
    pub hint_distance: f64,
    /// Height of the hint above the start (roughly eye level)
    pub hint_height: f64,
    /// Below this distance the agent counts as already there
    pub arrival_threshold: f64,
    /// Most points a straight line may carry; spacing widens past this
    pub max_line_points: usize,
}

impl FallbackConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            line_spacing: config::DEFAULT_LINE_SPACING,
            hint_distance: config::DEFAULT_HINT_DISTANCE,
            hint_height: config::DEFAULT_HINT_HEIGHT,
            arrival_threshold: config::DEFAULT_ARRIVAL_THRESHOLD,
            max_line_points: config::MAX_MARKERS,
        }
    }

    /// Checks that every parameter is usable.
    pub fn validate(&self) -> crate::VoxtrackResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(crate::VoxtrackError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };
        positive("line spacing", self.line_spacing)?;
        positive("hint distance", self.hint_distance)?;
        positive("arrival threshold", self.arrival_threshold)?;
        if self.max_line_points < 2 {
            return Err(crate::VoxtrackError::InvalidConfig(format!(
                "a line needs at least 2 points, got {}",
                self.max_line_points
            )));
        }
        if !self.hint_height.is_finite() {
            return Err(crate::VoxtrackError::InvalidConfig(
                "hint height must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A single oriented marker pointing from the agent toward its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionHint {
    /// Where to place the marker
    pub position: Vec3,
    /// Unit vector from start toward end
    pub direction: Vec3,
    /// Heading in degrees; 0 faces +z, 90 faces +x
    pub yaw: f64,
    /// Elevation in degrees; negative looks up
    pub pitch: f64,
    /// Straight-line distance to the target
    pub distance: f64,
}

impl DirectionHint {
    /// Builds a hint for the given endpoints, or `None` when they coincide.
    ///
    /// Endpoints too far apart for their distance to be represented still
    /// get a hint; its `distance` is reported as `f64::MAX`.
    pub fn toward(start: Vec3, end: Vec3, config: &FallbackConfig) -> Option<Self> {
        let delta = end - start;
        let distance = delta.length();
        let direction = if distance.is_finite() {
            delta.normalized()?
        } else {
            // Rescale so the largest component is 1 before normalizing
            let halved = end * 0.5 - start * 0.5;
            let largest = halved.x.abs().max(halved.y.abs()).max(halved.z.abs());
            if !(largest.is_finite() && largest > 0.0) {
                return None;
            }
            Vec3::new(halved.x / largest, halved.y / largest, halved.z / largest).normalized()?
        };
        let distance = if distance.is_finite() { distance } else { f64::MAX };

        let position = Vec3::new(
            start.x + direction.x * config.hint_distance,
            start.y + config.hint_height,
            start.z + direction.z * config.hint_distance,
        );

        Some(Self {
            position,
            direction,
            yaw: direction.x.atan2(direction.z).to_degrees(),
            pitch: (-direction.y.clamp(-1.0, 1.0)).asin().to_degrees(),
            distance,
        })
    }
}

/// Result of the fallback planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fallback {
    /// Start and end are effectively the same place
    Arrived,
    /// Straight-line samples from start to end
    Line(Path),
    /// A single marker facing the target
    Hint(DirectionHint),
}

/// Produces fallback guidance from `start` toward `end`.
///
/// Never fails for finite inputs. Endpoints closer than the arrival
/// threshold short-circuit to [`Fallback::Arrived`]. Lines are capped at
/// `config.max_line_points`.
///
/// # Examples
///
/// ```
/// use voxtrack::{fallback, Fallback, FallbackConfig, FallbackMode, Vec3};
///
/// let config = FallbackConfig::default();
/// let start = Vec3::new(0.0, 0.0, 0.0);
/// let end = Vec3::new(10.0, 0.0, 0.0);
///
/// match fallback(start, end, FallbackMode::DirectionHint, &config) {
///     Fallback::Hint(hint) => assert!((hint.yaw - 90.0).abs() < 1e-9),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn fallback(start: Vec3, end: Vec3, mode: FallbackMode, config: &FallbackConfig) -> Fallback {
    if start.distance(end) < config.arrival_threshold {
        return Fallback::Arrived;
    }

    match mode {
        FallbackMode::StraightLine => Fallback::Line(straight_line(
            start,
            end,
            config.line_spacing,
            config.max_line_points,
        )),
        FallbackMode::DirectionHint => match DirectionHint::toward(start, end, config) {
            Some(hint) => Fallback::Hint(hint),
            None => Fallback::Arrived,
        },
    }
}

/// Evenly interpolated points from `start` to `end`, both included, with
/// consecutive points no further apart than `spacing`.
///
/// At most `max_points` points are produced; longer lines spread them evenly
/// and so exceed `spacing`. A line whose length cannot be represented is just
/// its two endpoints.
pub fn straight_line(start: Vec3, end: Vec3, spacing: f64, max_points: usize) -> Path {
    let distance = start.distance(end);
    if !distance.is_finite() {
        return Path::new(vec![start, end]);
    }
    let spacing = if spacing.is_finite() && spacing > 0.0 {
        spacing
    } else {
        config::DEFAULT_LINE_SPACING
    };

    let max_segments = max_points.max(2) - 1;
    let wanted = (distance / spacing).floor() + 1.0;
    let segments = if wanted < max_segments as f64 {
        wanted as usize
    } else {
        max_segments
    };

    let points = (0..=segments)
        .map(|i| start.lerp(end, i as f64 / segments as f64))
        .collect();
    Path::new(points)
}
