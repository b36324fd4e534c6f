//! Integration tests for route planning and fallback behaviour on hand-built
//! worlds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use voxtrack::{
    new_agent_id, plan, FallbackMode, Guidance, NotFoundReason, Occupancy, OccupancyOracle,
    Planner, PlanningConfig, PlanningRequest, PlanningResult, RouteFailure, RouteTracker,
    SparseVoxelGrid, TrackerConfig, Vec3, VoxelBounds, VoxelCoord, VoxtrackError,
    VoxtrackResult,
};

/// Oracle that counts every query it answers.
struct CountingOracle<O> {
    inner: O,
    queries: AtomicUsize,
}

impl<O: OccupancyOracle> CountingOracle<O> {
    fn new(inner: O) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
        }
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl<O: OccupancyOracle> OccupancyOracle for CountingOracle<O> {
    fn query(&self, coord: VoxelCoord) -> Occupancy {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(coord)
    }
}

/// A world whose terrain has not been loaded anywhere.
struct UnloadedWorld;

impl OccupancyOracle for UnloadedWorld {
    fn query(&self, _coord: VoxelCoord) -> Occupancy {
        Occupancy::Unknown
    }
}

fn region(min: (i32, i32, i32), max: (i32, i32, i32)) -> VoxelBounds {
    VoxelBounds::new(
        VoxelCoord::new(min.0, min.1, min.2),
        VoxelCoord::new(max.0, max.1, max.2),
    )
}

fn request(start: Vec3, end: Vec3) -> PlanningRequest {
    PlanningRequest::new(new_agent_id(), start, end).with_config(PlanningConfig::for_testing())
}

/// Bounded room split in two by a wall too tall to climb.
fn walled_room() -> SparseVoxelGrid {
    let mut grid = SparseVoxelGrid::with_bounds(region((0, 0, -3), (10, 6, 3)));
    grid.fill_solid(region((0, 0, -3), (10, 0, 3)));
    grid.fill_solid(region((5, 1, -3), (5, 6, 3)));
    grid
}

#[test]
fn test_flat_corridor_route() -> VoxtrackResult<()> {
    let mut grid = SparseVoxelGrid::unbounded();
    grid.fill_solid(region((0, 9, 0), (10, 9, 0)));

    let result = plan(
        &grid,
        &request(Vec3::new(0.5, 10.0, 0.5), Vec3::new(10.5, 10.0, 0.5)),
    )?;
    let path = result.into_path().expect("corridor should be walkable");

    assert_eq!(path.len(), 11);
    for (i, point) in path.iter().enumerate() {
        assert_eq!(*point, Vec3::new(i as f64 + 0.5, 11.0, 0.5));
    }
    Ok(())
}

#[test]
fn test_distance_check_makes_no_queries() -> VoxtrackResult<()> {
    let oracle = CountingOracle::new(SparseVoxelGrid::unbounded());
    let mut req = request(Vec3::new(0.0, 0.0, 0.0), Vec3::new(300.0, 0.0, 0.0));
    req.config.max_path_length = 200.0;

    let result = Planner::new(&oracle).plan(&req)?;
    assert!(matches!(
        result,
        PlanningResult::DistanceExceeded { distance, limit } if distance == 300.0 && limit == 200.0
    ));
    assert_eq!(oracle.queries(), 0);
    Ok(())
}

#[test]
fn test_targets_across_the_world_exceed_the_limit() -> VoxtrackResult<()> {
    let oracle = CountingOracle::new(SparseVoxelGrid::unbounded());
    let req = request(Vec3::new(-2e9, 0.0, 0.0), Vec3::new(2e9, 0.0, 0.0));

    let result = Planner::new(&oracle).plan(&req)?;
    assert!(matches!(
        result,
        PlanningResult::DistanceExceeded { distance, .. } if distance == 4e9
    ));
    assert_eq!(oracle.queries(), 0);
    Ok(())
}

#[test]
fn test_positions_beyond_voxel_range_are_rejected() {
    let oracle = CountingOracle::new(SparseVoxelGrid::unbounded());
    let mut req = request(Vec3::new(1e12, 0.0, 0.0), Vec3::new(1e12 + 4.0, 0.0, 0.0));
    req.config.max_path_length = 200.0;

    assert!(matches!(
        Planner::new(&oracle).plan(&req),
        Err(VoxtrackError::InvalidRequest(_))
    ));
    assert_eq!(oracle.queries(), 0);
}

#[test]
fn test_terrain_is_read_at_most_once_per_voxel() -> VoxtrackResult<()> {
    let mut grid = SparseVoxelGrid::unbounded();
    grid.fill_solid(region((0, 0, -4), (12, 0, 4)));
    let oracle = CountingOracle::new(grid);

    let (result, stats) = Planner::new(&oracle)
        .plan_with_stats(&request(Vec3::new(0.5, 1.0, 0.5), Vec3::new(12.5, 1.0, 0.5)))?;
    assert!(result.is_found());

    // Each created node reads its footing and clearance; rejected neighbours
    // are bounded by the 26-neighbourhood of every expansion
    let upper_bound = stats.iterations * 26 * 3;
    assert!(oracle.queries() > 0);
    assert!(oracle.queries() <= upper_bound);
    Ok(())
}

#[test]
fn test_unloaded_world_has_no_route() -> VoxtrackResult<()> {
    let (result, stats) = Planner::new(UnloadedWorld)
        .plan_with_stats(&request(Vec3::new(0.5, 1.0, 0.5), Vec3::new(8.5, 1.0, 0.5)))?;

    assert_eq!(result, PlanningResult::NotFound(NotFoundReason::NoPathFound));
    assert_eq!(stats.iterations, 1);
    assert_eq!(stats.nodes_created, 1);
    Ok(())
}

#[test]
fn test_wall_blocks_route_and_tracker_hints() -> VoxtrackResult<()> {
    let grid = walled_room();
    let start = Vec3::new(1.5, 1.0, 0.5);
    let end = Vec3::new(9.5, 1.0, 0.5);

    let result = plan(&grid, &request(start, end))?;
    assert_eq!(result, PlanningResult::NotFound(NotFoundReason::NoPathFound));

    let tracker = RouteTracker::default();
    let outcome = tracker.route(&grid, new_agent_id(), start, end, FallbackMode::DirectionHint)?;
    assert_eq!(outcome.failure, Some(RouteFailure::NoPathFound));
    match outcome.guidance {
        Guidance::Hint(hint) => {
            assert!((hint.yaw - 90.0).abs() < 1e-9);
            assert_eq!(hint.position, Vec3::new(3.5, 2.5, 0.5));
        }
        other => panic!("expected a hint, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_wall_with_line_fallback() -> VoxtrackResult<()> {
    let grid = walled_room();
    let start = Vec3::new(1.5, 1.0, 0.5);
    let end = Vec3::new(9.5, 1.0, 0.5);

    let outcome =
        RouteTracker::default().route(&grid, new_agent_id(), start, end, FallbackMode::StraightLine)?;
    let Guidance::Line(line) = outcome.guidance else {
        panic!("expected a straight line");
    };
    // floor(8 / 2) + 1 segments
    assert_eq!(line.len(), 6);
    assert_eq!(line.first(), Some(start));
    assert_eq!(line.last(), Some(end));
    Ok(())
}

#[test]
fn test_budget_exhaustion_in_open_field() -> VoxtrackResult<()> {
    let mut grid = SparseVoxelGrid::unbounded();
    grid.fill_solid(region((-30, 0, -30), (30, 0, 30)));

    // Goal sits on a platform that cannot be climbed, so the search keeps
    // expanding the open field until the budget runs out
    grid.fill_solid(region((20, 1, 20), (22, 5, 22)));
    let mut req = request(Vec3::new(0.5, 1.0, 0.5), Vec3::new(21.5, 6.0, 21.5));
    req.config.max_iterations = 200;

    let (result, stats) = Planner::new(&grid).plan_with_stats(&req)?;
    assert_eq!(result, PlanningResult::NotFound(NotFoundReason::SearchExhausted));
    assert_eq!(stats.iterations, 200);
    assert!(stats.nodes_created <= 1 + 26 * 200);
    Ok(())
}

#[test]
fn test_start_equals_end() -> VoxtrackResult<()> {
    let mut grid = SparseVoxelGrid::unbounded();
    grid.set_solid(VoxelCoord::new(0, 0, 0));

    let point = Vec3::new(0.5, 1.0, 0.5);
    let path = plan(&grid, &request(point, point))?
        .into_path()
        .expect("start inside the acceptance radius");
    assert_eq!(path.len(), 1);
    assert_eq!(path.first(), Some(Vec3::new(0.5, 2.0, 0.5)));
    Ok(())
}

#[test]
fn test_stairs_climb_one_step_at_a_time() -> VoxtrackResult<()> {
    let mut grid = SparseVoxelGrid::unbounded();
    for step in 0..6 {
        grid.fill_solid(region((step, 0, 0), (step, step, 0)));
    }

    let path = plan(
        &grid,
        &request(Vec3::new(0.5, 1.0, 0.5), Vec3::new(5.5, 6.0, 0.5)),
    )?
    .into_path()
    .expect("stairs should be walkable");

    for pair in path.points().windows(2) {
        assert!((pair[1].y - pair[0].y).abs() <= 1.0);
    }
    assert_eq!(path.last(), Some(Vec3::new(5.5, 7.0, 0.5)));
    Ok(())
}

#[test]
fn test_concurrent_planners_share_world() {
    let mut grid = SparseVoxelGrid::unbounded();
    grid.fill_solid(region((0, 0, -5), (20, 0, 5)));
    let world = Arc::new(grid);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                let planner = Planner::new(world);
                let end = Vec3::new(10.5 + i as f64, 1.0, 0.5);
                planner
                    .plan(&request(Vec3::new(0.5, 1.0, 0.5), end))
                    .map(|r| r.is_found())
            })
        })
        .collect();

    for handle in handles {
        assert!(matches!(handle.join(), Ok(Ok(true))));
    }
}

#[test]
fn test_tracker_respects_custom_config() -> VoxtrackResult<()> {
    let mut grid = SparseVoxelGrid::unbounded();
    grid.fill_solid(region((0, 0, 0), (30, 0, 0)));

    let mut config = TrackerConfig::default();
    config.planning.max_path_length = 10.0;
    let tracker = RouteTracker::new(config)?;

    let outcome = tracker.route(
        &grid,
        new_agent_id(),
        Vec3::new(0.5, 1.0, 0.5),
        Vec3::new(25.5, 1.0, 0.5),
        FallbackMode::DirectionHint,
    )?;
    assert_eq!(outcome.failure, Some(RouteFailure::DistanceExceeded));
    assert_eq!(outcome.stats.iterations, 0);
    Ok(())
}
