//! # Search Engine
//!
//! Bounded A* over integer voxel coordinates.
//!
//! Nodes live in a per-call arena and are referenced by index. The frontier
//! is a binary heap of immutable `(f_score, sequence, index)` snapshots: an
//! improved node gets a fresh snapshot and the outdated one is skipped when
//! it surfaces. Equal scores pop in insertion order, so results are
//! reproducible.
//!
//! Closed voxels are never reopened. The Euclidean heuristic stays consistent
//! for step heights of one voxel; with taller steps a single climb can cost
//! less than its straight-line length and the route may be slightly longer
//! than the optimum.

use super::{reconstruct, NotFoundReason, Path, PlanningRequest, PlanningResult};
use crate::world::{Occupancy, OccupancyOracle, VoxelCoord};
use crate::VoxtrackResult;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Cost of a horizontal step along one axis.
pub const CARDINAL_COST: f64 = 1.0;

/// Cost of a horizontal step along both axes.
pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;

/// Extra cost of any step that changes height.
pub const VERTICAL_SURCHARGE: f64 = 0.5;

/// A voxel reached during search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode {
    /// Voxel the agent stands in
    pub coord: VoxelCoord,
    /// Best known cost from the start
    pub g_score: f64,
    /// `g_score` plus the heuristic estimate to the goal
    pub f_score: f64,
    /// Arena index of the node this one was reached from
    pub parent: Option<usize>,
}

impl SearchNode {
    /// Creates the root node of a search.
    pub fn root(coord: VoxelCoord, heuristic: f64) -> Self {
        Self {
            coord,
            g_score: 0.0,
            f_score: heuristic,
            parent: None,
        }
    }

    fn unreached(coord: VoxelCoord) -> Self {
        Self {
            coord,
            g_score: f64::INFINITY,
            f_score: f64::INFINITY,
            parent: None,
        }
    }
}

/// Counters describing the work a planning call performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes popped and expanded (or accepted as the goal)
    pub iterations: usize,
    /// Entries in the node arena when the search ended
    pub nodes_created: usize,
    /// Largest number of snapshots held by the frontier
    pub frontier_peak: usize,
}

/// Frontier snapshot of a node's priority at push time.
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    f_score: f64,
    sequence: u64,
    node: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Memoizes oracle answers for the duration of one call.
struct TerrainCache<'a, O: ?Sized> {
    oracle: &'a O,
    seen: HashMap<VoxelCoord, Occupancy>,
}

impl<'a, O: OccupancyOracle + ?Sized> TerrainCache<'a, O> {
    fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            seen: HashMap::new(),
        }
    }

    fn occupancy(&mut self, coord: VoxelCoord) -> Occupancy {
        let oracle = self.oracle;
        *self.seen.entry(coord).or_insert_with(|| oracle.query(coord))
    }

    /// Solid footing below, and `clearance` non-blocking voxels from the
    /// candidate upward.
    fn is_walkable(&mut self, coord: VoxelCoord, clearance: i32) -> bool {
        if !self.occupancy(coord.below()).provides_footing() {
            return false;
        }
        (0..clearance).all(|h| !self.occupancy(coord.offset(0, h, 0)).blocks_movement())
    }
}

/// Cost of moving by the given offset.
pub fn move_cost(dx: i32, dy: i32, dz: i32) -> f64 {
    let base = if dx != 0 && dz != 0 {
        DIAGONAL_COST
    } else {
        CARDINAL_COST
    };
    if dy != 0 {
        base + VERTICAL_SURCHARGE
    } else {
        base
    }
}

/// Route planner over an occupancy oracle.
///
/// The planner holds no state between calls; one instance can serve any
/// number of threads as long as the oracle supports concurrent reads.
///
/// # Examples
///
/// ```
/// use voxtrack::{new_agent_id, Planner, PlanningRequest, SparseVoxelGrid, Vec3, VoxelBounds, VoxelCoord};
///
/// let mut grid = SparseVoxelGrid::unbounded();
/// grid.fill_solid(VoxelBounds::new(VoxelCoord::new(0, 9, 0), VoxelCoord::new(10, 9, 0)));
///
/// let planner = Planner::new(&grid);
/// let request = PlanningRequest::new(
///     new_agent_id(),
///     Vec3::new(0.5, 10.0, 0.5),
///     Vec3::new(10.5, 10.0, 0.5),
/// );
/// assert!(planner.plan(&request).unwrap().is_found());
/// ```
#[derive(Debug, Clone)]
pub struct Planner<O> {
    oracle: O,
}

impl<O: OccupancyOracle> Planner<O> {
    /// Creates a planner reading terrain from `oracle`.
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// The oracle this planner reads from.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Plans a route for `request`.
    ///
    /// Only a malformed request is an error; every search failure is
    /// reported through [`PlanningResult`].
    pub fn plan(&self, request: &PlanningRequest) -> VoxtrackResult<PlanningResult> {
        self.plan_with_stats(request).map(|(result, _)| result)
    }

    /// Plans a route and reports how much work the search did.
    pub fn plan_with_stats(
        &self,
        request: &PlanningRequest,
    ) -> VoxtrackResult<(PlanningResult, SearchStats)> {
        request.validate()?;
        let config = &request.config;

        let direct = request.start.floor().distance(request.end.floor());
        if direct > config.max_path_length {
            trace!(
                "agent {}: {} -> {} is {:.1} voxels, limit {:.1}",
                request.agent,
                request.start,
                request.end,
                direct,
                config.max_path_length
            );
            return Ok((
                PlanningResult::DistanceExceeded {
                    distance: direct,
                    limit: config.max_path_length,
                },
                SearchStats::default(),
            ));
        }

        let (start, goal) = request.voxels()?;

        let mut terrain = TerrainCache::new(&self.oracle);
        let mut nodes = vec![SearchNode::root(start, direct)];
        let mut index: HashMap<VoxelCoord, usize> = HashMap::new();
        let mut closed: HashSet<VoxelCoord> = HashSet::new();
        let mut frontier = BinaryHeap::new();
        let mut sequence: u64 = 0;
        let mut stats = SearchStats::default();

        index.insert(start, 0);
        frontier.push(FrontierEntry {
            f_score: direct,
            sequence,
            node: 0,
        });
        stats.frontier_peak = 1;

        while stats.iterations < config.max_iterations {
            let Some(entry) = frontier.pop() else {
                stats.nodes_created = nodes.len();
                debug!(
                    "agent {}: frontier emptied after {} iterations",
                    request.agent, stats.iterations
                );
                return Ok((
                    PlanningResult::NotFound(NotFoundReason::NoPathFound),
                    stats,
                ));
            };

            let current = nodes[entry.node].coord;
            if closed.contains(&current) || entry.f_score != nodes[entry.node].f_score {
                continue;
            }
            stats.iterations += 1;

            if current.distance(goal) < config.acceptance_radius {
                let path = reconstruct(&nodes, entry.node, config.stand_height);
                stats.nodes_created = nodes.len();
                debug!(
                    "agent {}: route of {} waypoints after {} iterations",
                    request.agent,
                    path.len(),
                    stats.iterations
                );
                return Ok((PlanningResult::Found(path), stats));
            }

            closed.insert(current);
            let current_g = nodes[entry.node].g_score;

            for dx in -1..=1 {
                for dz in -1..=1 {
                    for dy in -config.step_height..=config.step_height {
                        if dx == 0 && dy == 0 && dz == 0 {
                            continue;
                        }

                        let neighbor = current.offset(dx, dy, dz);
                        if closed.contains(&neighbor) {
                            continue;
                        }
                        if !terrain.is_walkable(neighbor, config.agent_clearance) {
                            continue;
                        }

                        let tentative_g = current_g + move_cost(dx, dy, dz);
                        let slot = *index.entry(neighbor).or_insert_with(|| {
                            nodes.push(SearchNode::unreached(neighbor));
                            nodes.len() - 1
                        });

                        if tentative_g < nodes[slot].g_score {
                            let f_score = tentative_g + neighbor.distance(goal);
                            let node = &mut nodes[slot];
                            node.parent = Some(entry.node);
                            node.g_score = tentative_g;
                            node.f_score = f_score;

                            sequence += 1;
                            frontier.push(FrontierEntry {
                                f_score,
                                sequence,
                                node: slot,
                            });
                            stats.frontier_peak = stats.frontier_peak.max(frontier.len());
                        }
                    }
                }
            }
        }

        stats.nodes_created = nodes.len();
        let pending = frontier.iter().any(|entry| {
            let node = &nodes[entry.node];
            !closed.contains(&node.coord) && entry.f_score == node.f_score
        });

        if pending {
            debug!(
                "agent {}: iteration budget of {} exhausted",
                request.agent, config.max_iterations
            );
            Ok((
                PlanningResult::NotFound(NotFoundReason::SearchExhausted),
                stats,
            ))
        } else {
            debug!(
                "agent {}: no route after {} iterations",
                request.agent, stats.iterations
            );
            Ok((
                PlanningResult::NotFound(NotFoundReason::NoPathFound),
                stats,
            ))
        }
    }
}

/// Plans a single request without keeping a [`Planner`] around.
pub fn plan<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    request: &PlanningRequest,
) -> VoxtrackResult<PlanningResult> {
    Planner::new(oracle).plan(request)
}

/// Total traversal cost of a raw route under the planner's cost model.
///
/// Returns `None` if two consecutive waypoints are not a single legal move
/// apart.
pub fn route_cost(path: &Path, stand_height: f64) -> Option<f64> {
    let voxels: Vec<VoxelCoord> = path
        .iter()
        .map(|p| VoxelCoord::from_point(crate::world::Vec3::new(p.x, p.y - stand_height, p.z)))
        .collect();

    let mut total = 0.0;
    for pair in voxels.windows(2) {
        let dx = pair[1].x as i64 - pair[0].x as i64;
        let dy = pair[1].y as i64 - pair[0].y as i64;
        let dz = pair[1].z as i64 - pair[0].z as i64;
        if dx.abs() > 1 || dz.abs() > 1 || (dx == 0 && dy == 0 && dz == 0) {
            return None;
        }
        total += move_cost(dx as i32, dy.signum() as i32, dz as i32);
    }
    Some(total)
}
