//! # Paths
//!
//! The waypoint sequence type, reconstruction from the search tree, and
//! colinear-run simplification.

use super::SearchNode;
use crate::config;
use crate::world::{Vec3, VoxelCoord};
use serde::{Deserialize, Serialize};

/// An immutable ordered sequence of waypoints.
///
/// Consecutive identical points are dropped on construction. An empty path
/// signals that no route exists.
///
/// # Examples
///
/// ```
/// use voxtrack::{Path, Vec3};
///
/// let path = Path::new(vec![
///     Vec3::new(0.0, 0.0, 0.0),
///     Vec3::new(0.0, 0.0, 0.0),
///     Vec3::new(3.0, 0.0, 4.0),
/// ]);
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.length(), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Vec3>", into = "Vec<Vec3>")]
pub struct Path {
    points: Vec<Vec3>,
}

impl Path {
    /// Creates a path, removing consecutive duplicates.
    pub fn new(mut points: Vec<Vec3>) -> Self {
        points.dedup();
        Self { points }
    }

    /// The empty path.
    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the path has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First waypoint.
    pub fn first(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    /// Last waypoint.
    pub fn last(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    /// Waypoints as a slice.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Iterates the waypoints in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec3> {
        self.points.iter()
    }

    /// Consumes the path, returning its waypoints.
    pub fn into_points(self) -> Vec<Vec3> {
        self.points
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

impl From<Vec<Vec3>> for Path {
    fn from(points: Vec<Vec3>) -> Self {
        Self::new(points)
    }
}

impl From<Path> for Vec<Vec3> {
    fn from(path: Path) -> Self {
        path.points
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Vec3;
    type IntoIter = std::slice::Iter<'a, Vec3>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Maps a voxel to the waypoint an agent standing in it occupies: centred on
/// the horizontal axes and raised by `stand_height`.
pub fn voxel_to_waypoint(coord: VoxelCoord, stand_height: f64) -> Vec3 {
    Vec3::new(
        coord.x as f64 + 0.5,
        coord.y as f64 + stand_height,
        coord.z as f64 + 0.5,
    )
}

/// Walks parent links from `goal` back to the root of the search tree and
/// returns the route in start-to-goal order.
pub fn reconstruct(nodes: &[SearchNode], goal: usize, stand_height: f64) -> Path {
    let mut points = Vec::new();
    let mut current = Some(goal);

    while let Some(index) = current {
        let Some(node) = nodes.get(index) else {
            break;
        };
        points.push(voxel_to_waypoint(node.coord, stand_height));
        current = node.parent;
    }

    points.reverse();
    Path::new(points)
}

/// Removes interior waypoints that continue the previous direction, using
/// the default tolerance.
pub fn simplify(path: &Path) -> Path {
    simplify_with_epsilon(path, config::DEFAULT_SIMPLIFY_EPSILON)
}

/// Removes interior waypoints where the route keeps its heading: the unit
/// directions of the incoming and outgoing segments agree within `epsilon`
/// on every axis. The first and last waypoints are kept.
///
/// Passes repeat until nothing more can be removed, so the result is a fixed
/// point and simplifying it again changes nothing.
pub fn simplify_with_epsilon(path: &Path, epsilon: f64) -> Path {
    let mut current = path.clone();
    loop {
        let next = Path::new(simplify_pass(current.points(), epsilon));
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

fn simplify_pass(points: &[Vec3], epsilon: f64) -> Vec<Vec3> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept = Vec::with_capacity(points.len());
    kept.push(first);

    for window in points.windows(3) {
        let incoming = (window[1] - window[0]).normalized();
        let outgoing = (window[2] - window[1]).normalized();

        // A waypoint on top of a neighbour adds no heading of its own
        let (Some(incoming), Some(outgoing)) = (incoming, outgoing) else {
            continue;
        };

        let turns = (incoming.x - outgoing.x).abs() > epsilon
            || (incoming.y - outgoing.y).abs() > epsilon
            || (incoming.z - outgoing.z).abs() > epsilon;
        if turns {
            kept.push(window[1]);
        }
    }

    kept.push(last);
    kept
}
