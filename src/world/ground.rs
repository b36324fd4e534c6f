//! # Ground Snapping
//!
//! Locates the standing surface beneath a continuous position, so a target
//! hovering in the air (jumping, flying, mounted) is planned to the ground
//! beneath it.

use super::{Occupancy, OccupancyOracle, VoxelCoord};

/// Scans downward from `start_y` for the first solid voxel in the column at
/// `(x, z)` and returns the height of its top face.
///
/// At most `max_depth` voxels are examined. Unknown voxels above the loaded
/// region are skipped; once the scan has entered loaded terrain, running out
/// of it again ends the scan. Returns `None` if nothing solid is found.
///
/// # Examples
///
/// ```
/// use voxtrack::{find_ground_level, SparseVoxelGrid, VoxelCoord};
///
/// let mut grid = SparseVoxelGrid::unbounded();
/// grid.set_solid(VoxelCoord::new(0, 4, 0));
///
/// assert_eq!(find_ground_level(&grid, 0.5, 20.0, 0.5, 64), Some(5.0));
/// ```
pub fn find_ground_level<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    x: f64,
    start_y: f64,
    z: f64,
    max_depth: u32,
) -> Option<f64> {
    if !(x.is_finite() && start_y.is_finite() && z.is_finite()) {
        return None;
    }

    let column = VoxelCoord::from_point(super::Vec3::new(x, start_y, z));
    let mut entered = false;
    for depth in 0..max_depth as i32 {
        let cell = column.offset(0, -depth, 0);
        match oracle.query(cell) {
            Occupancy::Solid => return Some(cell.y as f64 + 1.0),
            Occupancy::Open => entered = true,
            Occupancy::Unknown if entered => return None,
            Occupancy::Unknown => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SparseVoxelGrid, VoxelBounds};

    #[test]
    fn test_snaps_to_first_surface_below() {
        let mut grid = SparseVoxelGrid::unbounded();
        grid.set_solid(VoxelCoord::new(3, 2, 3));
        grid.set_solid(VoxelCoord::new(3, 7, 3));

        assert_eq!(find_ground_level(&grid, 3.2, 12.0, 3.9, 32), Some(8.0));
        assert_eq!(find_ground_level(&grid, 3.2, 6.5, 3.9, 32), Some(3.0));
    }

    #[test]
    fn test_inside_solid_returns_its_top() {
        let mut grid = SparseVoxelGrid::unbounded();
        grid.set_solid(VoxelCoord::new(0, 5, 0));
        assert_eq!(find_ground_level(&grid, 0.0, 5.5, 0.0, 8), Some(6.0));
    }

    #[test]
    fn test_unknown_column_has_no_ground() {
        let grid = SparseVoxelGrid::with_bounds(VoxelBounds::new(
            VoxelCoord::new(0, 0, 0),
            VoxelCoord::new(4, 4, 4),
        ));
        assert_eq!(find_ground_level(&grid, 10.0, 3.0, 10.0, 16), None);
        // Scan leaves the loaded region before finding ground
        assert_eq!(find_ground_level(&grid, 1.0, 3.0, 1.0, 16), None);
    }

    #[test]
    fn test_scan_from_above_loaded_region() {
        let mut grid = SparseVoxelGrid::with_bounds(VoxelBounds::new(
            VoxelCoord::new(0, 0, 0),
            VoxelCoord::new(4, 4, 4),
        ));
        grid.set_solid(VoxelCoord::new(2, 1, 2));
        assert_eq!(find_ground_level(&grid, 2.5, 20.0, 2.5, 32), Some(2.0));
    }

    #[test]
    fn test_depth_limit() {
        let mut grid = SparseVoxelGrid::unbounded();
        grid.set_solid(VoxelCoord::new(0, 0, 0));
        assert_eq!(find_ground_level(&grid, 0.0, 50.0, 0.0, 10), None);
        assert_eq!(find_ground_level(&grid, 0.0, 50.0, 0.0, 51), Some(1.0));
    }
}
