//! Performance tests for planning over generated terrain

use std::time::Instant;
use voxtrack::{
    find_ground_level, new_agent_id, FallbackMode, Planner, PlanningRequest, RouteTracker,
    TerrainConfig, TerrainGenerator, Vec3, VoxtrackResult,
};

fn standing_point(world: &voxtrack::SparseVoxelGrid, x: f64, z: f64) -> Vec3 {
    let top = world.bounds().map(|b| b.max.y as f64).unwrap_or(64.0);
    let y = find_ground_level(world, x, top, z, 128).expect("generated terrain has ground");
    Vec3::new(x, y, z)
}

#[test]
fn test_cross_terrain_planning_performance() -> VoxtrackResult<()> {
    let world = TerrainGenerator::new().generate(&TerrainConfig::new(2024))?;
    let planner = Planner::new(&world);

    let start = standing_point(&world, 2.5, 2.5);
    let end = standing_point(&world, 60.5, 60.5);
    let request = PlanningRequest::new(new_agent_id(), start, end);

    let begin = Instant::now();
    let iterations = 10;
    let mut last_stats = None;
    for _ in 0..iterations {
        let (_, stats) = planner.plan_with_stats(&request)?;
        last_stats = Some(stats);
    }
    let elapsed = begin.elapsed();
    let average = elapsed / iterations;

    println!("Average planning time: {:?}", average);
    println!("Last search: {:?}", last_stats);

    let stats = last_stats.expect("at least one search ran");
    assert!(stats.iterations <= request.config.max_iterations);
    assert!(stats.nodes_created <= 1 + 26 * stats.iterations);

    // Generous limit so debug builds on slow machines pass
    assert!(
        average.as_millis() < 2_000,
        "planning took {:?} on average",
        average
    );
    Ok(())
}

#[test]
fn test_tracker_many_short_routes() -> VoxtrackResult<()> {
    let world = TerrainGenerator::new().generate(&TerrainConfig::new(7))?;
    let tracker = RouteTracker::default();
    let agent = new_agent_id();

    let begin = Instant::now();
    let mut routes = 0;
    for i in 0..50 {
        let x = 4.5 + (i % 10) as f64 * 5.0;
        let z = 4.5 + (i / 10) as f64 * 10.0;
        let start = standing_point(&world, x, z);
        let end = standing_point(&world, x + 6.0, z + 4.0);

        let outcome = tracker.route(&world, agent, start, end, FallbackMode::DirectionHint)?;
        if outcome.guidance.is_route() {
            routes += 1;
        }
    }
    let elapsed = begin.elapsed();

    println!("50 short routes in {:?} ({} walkable)", elapsed, routes);
    assert!(routes > 0);
    assert!(elapsed.as_secs() < 10, "short routes took {:?}", elapsed);
    Ok(())
}
