//! # Terrain Generation
//!
//! Seeded heightmap worlds for demos, benchmarks and tests. A Perlin height
//! field forms rolling ground and a seeded RNG scatters solid pillars that
//! routes have to bend around.

use super::{SparseVoxelGrid, VoxelBounds, VoxelCoord};
use crate::{VoxtrackError, VoxtrackResult};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for terrain generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Extent along x in voxels
    pub width: u32,
    /// Extent along z in voxels
    pub depth: u32,
    /// Surface height where the noise is zero
    pub base_height: i32,
    /// Maximum deviation of the surface from `base_height`
    pub amplitude: f64,
    /// Noise frequency per voxel; lower values give smoother hills
    pub frequency: f64,
    /// Probability (0.0 to 1.0) that a column carries a pillar
    pub pillar_chance: f64,
    /// Height of each pillar above the surface
    pub pillar_height: u32,
}

impl TerrainConfig {
    /// Creates a default terrain configuration.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: 64,
            depth: 64,
            base_height: 8,
            amplitude: 3.0,
            frequency: 0.06,
            pillar_chance: 0.04,
            pillar_height: 3,
        }
    }

    /// Creates a small, gentle configuration for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 24,
            depth: 24,
            base_height: 4,
            amplitude: 1.0,
            frequency: 0.08,
            pillar_chance: 0.02,
            pillar_height: 3,
        }
    }

    /// Checks that the parameters describe a buildable world.
    pub fn validate(&self) -> VoxtrackResult<()> {
        if self.width == 0 || self.depth == 0 {
            return Err(VoxtrackError::InvalidConfig(
                "terrain width and depth must be positive".to_string(),
            ));
        }
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return Err(VoxtrackError::InvalidConfig(format!(
                "terrain amplitude must be a non-negative number, got {}",
                self.amplitude
            )));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(VoxtrackError::InvalidConfig(format!(
                "terrain frequency must be positive, got {}",
                self.frequency
            )));
        }
        if !(0.0..=1.0).contains(&self.pillar_chance) {
            return Err(VoxtrackError::InvalidConfig(format!(
                "pillar chance must be within 0.0..=1.0, got {}",
                self.pillar_chance
            )));
        }
        Ok(())
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Builds heightmap worlds from a [`TerrainConfig`].
#[derive(Debug, Clone, Default)]
pub struct TerrainGenerator;

impl TerrainGenerator {
    /// Creates a new generator.
    pub fn new() -> Self {
        Self
    }

    /// Generates a bounded grid. The loaded region covers the terrain
    /// footprint plus headroom above the tallest pillar.
    pub fn generate(&self, config: &TerrainConfig) -> VoxtrackResult<SparseVoxelGrid> {
        config.validate()?;

        let perlin = Perlin::new(config.seed as u32);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let swing = config.amplitude.ceil() as i32;
        let bottom = config.base_height - swing - 1;
        let top = config.base_height + swing + config.pillar_height as i32 + 3;

        let bounds = VoxelBounds::new(
            VoxelCoord::new(0, bottom, 0),
            VoxelCoord::new(config.width as i32 - 1, top, config.depth as i32 - 1),
        );
        let mut grid = SparseVoxelGrid::with_bounds(bounds);

        for z in 0..config.depth as i32 {
            for x in 0..config.width as i32 {
                let surface = self.surface_height(&perlin, config, x, z);
                for y in bottom..surface {
                    grid.set_solid(VoxelCoord::new(x, y, z));
                }

                if rng.gen_bool(config.pillar_chance) {
                    for y in surface..surface + config.pillar_height as i32 {
                        grid.set_solid(VoxelCoord::new(x, y, z));
                    }
                }
            }
        }

        log::debug!(
            "generated {}x{} terrain (seed {}) with {} solid voxels",
            config.width,
            config.depth,
            config.seed,
            grid.solid_count()
        );

        Ok(grid)
    }

    /// First open voxel height of a column (the height an agent stands at).
    fn surface_height(&self, perlin: &Perlin, config: &TerrainConfig, x: i32, z: i32) -> i32 {
        let sample = perlin.get([x as f64 * config.frequency, z as f64 * config.frequency]);
        config.base_height + (sample.clamp(-1.0, 1.0) * config.amplitude).round() as i32
    }
}
