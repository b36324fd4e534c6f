//! # World Module
//!
//! Voxel addressing, continuous positions, and the occupancy interface the
//! planner reads terrain through.
//!
//! This module contains the fundamental building blocks shared by every
//! planning stage:
//! - Integer voxel coordinates
//! - Continuous world-space points for waypoints and hints
//! - The occupancy oracle trait plus an in-memory sparse implementation
//! - Ground snapping and seeded demo terrain

pub mod grid;
pub mod ground;
pub mod terrain;

pub use grid::*;
pub use ground::*;
pub use terrain::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest distance from the origin, in voxels along any axis, at which the
/// planner accepts a position.
pub const VOXEL_LIMIT: i32 = 1 << 30;

/// Integer address of a unit cube in the world grid.
///
/// # Examples
///
/// ```
/// use voxtrack::{Vec3, VoxelCoord};
///
/// let coord = VoxelCoord::from_point(Vec3::new(3.7, -0.2, 10.0));
/// assert_eq!(coord, VoxelCoord::new(3, -1, 10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the voxel containing a continuous point (each axis floored).
    pub fn from_point(point: Vec3) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// Returns the voxel containing `point`, or `None` when the point is not
    /// finite or lies more than [`VOXEL_LIMIT`] voxels from the origin on any
    /// axis.
    ///
    /// ```
    /// use voxtrack::{Vec3, VoxelCoord};
    ///
    /// assert!(VoxelCoord::try_from_point(Vec3::new(1.5, 2.0, -3.0)).is_some());
    /// assert!(VoxelCoord::try_from_point(Vec3::new(3e9, 0.0, 0.0)).is_none());
    /// ```
    pub fn try_from_point(point: Vec3) -> Option<Self> {
        let limit = VOXEL_LIMIT as f64;
        let floored = point.floor();
        let in_range = |v: f64| v.is_finite() && v.abs() <= limit;
        if in_range(floored.x) && in_range(floored.y) && in_range(floored.z) {
            Some(Self::from_point(floored))
        } else {
            None
        }
    }

    /// Calculates the Euclidean distance to another coordinate.
    pub fn distance(self, other: VoxelCoord) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        let dz = other.z as f64 - self.z as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Returns the coordinate offset by the given deltas, clamped to the
    /// `i32` range.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.z.saturating_add(dz),
        )
    }

    /// Returns the voxel directly below.
    pub fn below(self) -> Self {
        self.offset(0, -1, 0)
    }
}

impl std::fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A continuous world-space point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Floors every component.
    pub fn floor(self) -> Vec3 {
        Self::new(self.x.floor(), self.y.floor(), self.z.floor())
    }

    /// Euclidean length of the vector.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Vec3) -> f64 {
        (other - self).length()
    }

    /// Returns the unit vector in the same direction, or `None` for a
    /// zero-length vector.
    pub fn normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len > f64::EPSILON {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// Linear interpolation: `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Vec3, t: f64) -> Vec3 {
        self + (other - self) * t
    }

    /// True when every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, scale: f64) -> Self {
        Self::new(self.x * scale, self.y * scale, self.z * scale)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// What a single voxel contains, as far as movement is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupancy {
    /// Blocks movement and can be stood on
    Solid,
    /// Air or any non-blocking content
    Open,
    /// Voxel data is not available yet
    Unknown,
}

impl Occupancy {
    /// Whether this voxel prevents an agent from occupying it.
    ///
    /// Unknown terrain is never assumed passable.
    pub fn blocks_movement(self) -> bool {
        !matches!(self, Occupancy::Open)
    }

    /// Whether an agent can stand on top of this voxel.
    pub fn provides_footing(self) -> bool {
        matches!(self, Occupancy::Solid)
    }
}

/// Read-only view of terrain occupancy.
///
/// Implementations must answer immediately: voxels whose data has not been
/// loaded are reported as [`Occupancy::Unknown`] rather than awaited.
pub trait OccupancyOracle: Send + Sync {
    /// Reports the occupancy of a single voxel.
    fn query(&self, coord: VoxelCoord) -> Occupancy;

    /// Whether the backing world can be read at all.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for &T {
    fn query(&self, coord: VoxelCoord) -> Occupancy {
        (**self).query(coord)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for Box<T> {
    fn query(&self, coord: VoxelCoord) -> Occupancy {
        (**self).query(coord)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for Arc<T> {
    fn query(&self, coord: VoxelCoord) -> Occupancy {
        (**self).query(coord)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
