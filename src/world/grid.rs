//! # Sparse Voxel Grid
//!
//! In-memory occupancy storage with loaded-region semantics, plus the JSON
//! snapshot format the command line tool reads worlds from.

use super::{Occupancy, OccupancyOracle, VoxelCoord};
use crate::{VoxtrackError, VoxtrackResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path as FsPath;

/// Inclusive axis-aligned box of voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelBounds {
    pub min: VoxelCoord,
    pub max: VoxelCoord,
}

impl VoxelBounds {
    /// Creates a box from two corners in any order.
    pub fn new(a: VoxelCoord, b: VoxelCoord) -> Self {
        Self {
            min: VoxelCoord::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: VoxelCoord::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Checks whether a voxel lies inside the box.
    pub fn contains(&self, coord: VoxelCoord) -> bool {
        coord.x >= self.min.x
            && coord.x <= self.max.x
            && coord.y >= self.min.y
            && coord.y <= self.max.y
            && coord.z >= self.min.z
            && coord.z <= self.max.z
    }

    /// Number of voxels in the box, saturating at `u64::MAX`.
    pub fn volume(&self) -> u64 {
        let extent = |min: i32, max: i32| (max as i64 - min as i64 + 1).max(0) as u64;
        extent(self.min.x, self.max.x)
            .saturating_mul(extent(self.min.y, self.max.y))
            .saturating_mul(extent(self.min.z, self.max.z))
    }

    /// Iterates every voxel in the box, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = VoxelCoord> + '_ {
        (self.min.z..=self.max.z).flat_map(move |z| {
            (self.min.y..=self.max.y)
                .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| VoxelCoord::new(x, y, z)))
        })
    }
}

/// Sparse occupancy grid.
///
/// Only solid voxels are stored. Inside the loaded region every other voxel
/// is open; outside it every voxel is unknown. A grid without a loaded
/// region treats the whole world as loaded.
///
/// # Examples
///
/// ```
/// use voxtrack::{Occupancy, OccupancyOracle, SparseVoxelGrid, VoxelBounds, VoxelCoord};
///
/// let bounds = VoxelBounds::new(VoxelCoord::new(0, 0, 0), VoxelCoord::new(9, 9, 9));
/// let mut grid = SparseVoxelGrid::with_bounds(bounds);
/// grid.set_solid(VoxelCoord::new(1, 1, 1));
///
/// assert_eq!(grid.query(VoxelCoord::new(1, 1, 1)), Occupancy::Solid);
/// assert_eq!(grid.query(VoxelCoord::new(2, 1, 1)), Occupancy::Open);
/// assert_eq!(grid.query(VoxelCoord::new(20, 1, 1)), Occupancy::Unknown);
/// ```
#[derive(Debug, Clone)]
pub struct SparseVoxelGrid {
    solids: HashSet<VoxelCoord>,
    bounds: Option<VoxelBounds>,
    available: bool,
}

impl Default for SparseVoxelGrid {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl SparseVoxelGrid {
    /// Creates an empty grid where every voxel counts as loaded.
    pub fn unbounded() -> Self {
        Self {
            solids: HashSet::new(),
            bounds: None,
            available: true,
        }
    }

    /// Creates an empty grid whose loaded region is `bounds`.
    pub fn with_bounds(bounds: VoxelBounds) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::unbounded()
        }
    }

    /// The loaded region, if restricted.
    pub fn bounds(&self) -> Option<VoxelBounds> {
        self.bounds
    }

    /// Number of stored solid voxels.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    /// Marks a voxel solid.
    pub fn set_solid(&mut self, coord: VoxelCoord) {
        self.solids.insert(coord);
    }

    /// Clears a voxel back to open.
    pub fn set_open(&mut self, coord: VoxelCoord) {
        self.solids.remove(&coord);
    }

    /// Marks every voxel in the box solid.
    pub fn fill_solid(&mut self, region: VoxelBounds) {
        for coord in region.iter() {
            self.solids.insert(coord);
        }
    }

    /// Clears every voxel in the box.
    pub fn clear_region(&mut self, region: VoxelBounds) {
        for coord in region.iter() {
            self.solids.remove(&coord);
        }
    }

    /// Simulates the backing world becoming unreachable (or reachable again).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Builds a grid from a snapshot, validating its regions.
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> VoxtrackResult<Self> {
        if let Some(bounds) = snapshot.bounds {
            check_ordered(&bounds)?;
        }

        let mut grid = match snapshot.bounds {
            Some(bounds) => Self::with_bounds(bounds),
            None => Self::unbounded(),
        };

        for region in &snapshot.solid_regions {
            check_ordered(region)?;
            if region.volume() > MAX_REGION_VOLUME {
                return Err(VoxtrackError::InvalidWorld(format!(
                    "solid region {} .. {} exceeds {} voxels",
                    region.min, region.max, MAX_REGION_VOLUME
                )));
            }
            grid.fill_solid(*region);
        }
        for coord in &snapshot.solids {
            grid.set_solid(*coord);
        }

        Ok(grid)
    }

    /// Captures the grid as a snapshot listing individual solid voxels.
    pub fn to_snapshot(&self) -> WorldSnapshot {
        let mut solids: Vec<VoxelCoord> = self.solids.iter().copied().collect();
        solids.sort();
        WorldSnapshot {
            bounds: self.bounds,
            solid_regions: Vec::new(),
            solids,
        }
    }

    /// Loads a grid from a JSON snapshot file.
    pub fn load_from_file<P: AsRef<FsPath>>(path: P) -> VoxtrackResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: WorldSnapshot = serde_json::from_str(&json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Writes the grid to a JSON snapshot file.
    pub fn save_to_file<P: AsRef<FsPath>>(&self, path: P) -> VoxtrackResult<()> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Upper bound on a single snapshot region, to keep malformed files from
/// allocating unbounded sets.
const MAX_REGION_VOLUME: u64 = 16_000_000;

fn check_ordered(bounds: &VoxelBounds) -> VoxtrackResult<()> {
    let ordered = bounds.min.x <= bounds.max.x
        && bounds.min.y <= bounds.max.y
        && bounds.min.z <= bounds.max.z;
    if ordered {
        Ok(())
    } else {
        Err(VoxtrackError::InvalidWorld(format!(
            "region min {} is not below max {}",
            bounds.min, bounds.max
        )))
    }
}

impl OccupancyOracle for SparseVoxelGrid {
    fn query(&self, coord: VoxelCoord) -> Occupancy {
        if let Some(bounds) = &self.bounds {
            if !bounds.contains(coord) {
                return Occupancy::Unknown;
            }
        }
        if self.solids.contains(&coord) {
            Occupancy::Solid
        } else {
            Occupancy::Open
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Serializable description of a voxel world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Loaded region; voxels outside it read as unknown
    #[serde(default)]
    pub bounds: Option<VoxelBounds>,
    /// Boxes filled with solid voxels
    #[serde(default)]
    pub solid_regions: Vec<VoxelBounds>,
    /// Individual solid voxels
    #[serde(default)]
    pub solids: Vec<VoxelCoord>,
}
