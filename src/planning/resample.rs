//! # Waypoint Resampling
//!
//! Re-derives evenly spaced points along a path by arc length, so a consumer
//! stepping at a fixed rate (markers, autopilot ticks) is independent of the
//! planner's waypoint geometry.

use super::Path;
use crate::world::Vec3;
use crate::{VoxtrackError, VoxtrackResult};

/// Segments shorter than this are treated as zero length.
const MIN_SEGMENT: f64 = 1e-9;

fn check_parameters(spacing: f64, max_points: usize) -> VoxtrackResult<()> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(VoxtrackError::InvalidRequest(format!(
            "spacing must be positive, got {}",
            spacing
        )));
    }
    if max_points < 2 {
        return Err(VoxtrackError::InvalidRequest(format!(
            "point cap must allow at least 2 points, got {}",
            max_points
        )));
    }
    Ok(())
}

/// Samples `path` every `spacing` units of arc length.
///
/// The first and last original points are emitted verbatim; every point in
/// between is interpolated exactly at a multiple of `spacing`. When more than
/// `max_points` samples would be produced, only the first `max_points` are
/// kept and the tail of the path is dropped.
///
/// # Examples
///
/// ```
/// use voxtrack::{resample, Path, Vec3};
///
/// let path = Path::new(vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)]);
/// let points = resample(&path, 2.0, 50).unwrap();
/// assert_eq!(
///     points,
///     vec![
///         Vec3::new(0.0, 0.0, 0.0),
///         Vec3::new(2.0, 0.0, 0.0),
///         Vec3::new(4.0, 0.0, 0.0),
///         Vec3::new(5.0, 0.0, 0.0),
///     ]
/// );
/// ```
pub fn resample(path: &Path, spacing: f64, max_points: usize) -> VoxtrackResult<Vec<Vec3>> {
    check_parameters(spacing, max_points)?;

    let points = path.points();
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Ok(Vec::new());
    };

    let total = path.length();
    let mut samples = vec![first];
    let mut travelled = 0.0;
    let mut next_mark = spacing;
    let mut truncated = false;

    'segments: for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = a.distance(b);
        if length < MIN_SEGMENT {
            continue;
        }

        // Marks landing on the final point are covered by the verbatim endpoint
        while next_mark <= travelled + length && next_mark < total - MIN_SEGMENT {
            if samples.len() >= max_points {
                truncated = true;
                break 'segments;
            }
            let t = (next_mark - travelled) / length;
            samples.push(a.lerp(b, t));
            next_mark += spacing;
        }
        travelled += length;
    }

    if points.len() > 1 {
        if samples.len() < max_points {
            samples.push(last);
        } else {
            truncated = true;
        }
    }
    if truncated {
        log::debug!(
            "resampled path of length {:.1} truncated to {} points",
            total,
            max_points
        );
    }

    Ok(samples)
}

/// Thins a path to original waypoints at least `spacing` apart along the
/// route.
///
/// A waypoint is kept once the distance accumulated since the last kept one
/// reaches `spacing`; the destination is always appended. Unlike
/// [`resample`], no new points are created. The result is capped at
/// `max_points` by dropping the tail.
pub fn decimate(path: &Path, spacing: f64, max_points: usize) -> VoxtrackResult<Vec<Vec3>> {
    check_parameters(spacing, max_points)?;

    let points = path.points();
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Ok(Vec::new());
    };

    let mut kept = vec![first];
    let mut accumulated = 0.0;
    for pair in points.windows(2) {
        accumulated += pair[0].distance(pair[1]);
        if accumulated >= spacing {
            kept.push(pair[1]);
            accumulated = 0.0;
        }
    }

    if kept.last() != Some(&last) {
        kept.push(last);
    }
    kept.truncate(max_points);
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polyline(points: &[(f64, f64, f64)]) -> Path {
        Path::new(points.iter().map(|&(x, y, z)| Vec3::new(x, y, z)).collect())
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_exact_multiple_does_not_duplicate_end() {
        let path = polyline(&[(0.0, 0.0, 0.0), (4.0, 0.0, 0.0)]);
        let points = resample(&path, 2.0, 50).unwrap();
        assert_eq!(
            points,
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn test_samples_follow_corners() {
        let path = polyline(&[(0.0, 0.0, 0.0), (3.0, 0.0, 0.0), (3.0, 0.0, 3.0)]);
        let points = resample(&path, 2.0, 50).unwrap();
        assert_eq!(points.len(), 4);
        assert!(close(points[1], Vec3::new(2.0, 0.0, 0.0)));
        assert!(close(points[2], Vec3::new(3.0, 0.0, 1.0)));
        assert_eq!(points[3], Vec3::new(3.0, 0.0, 3.0));
    }

    #[test]
    fn test_spacing_never_exceeded() {
        let path = polyline(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 1.0, 1.0),
            (2.0, 1.0, 5.0),
            (7.0, 1.0, 5.0),
        ]);
        let points = resample(&path, 1.5, 100).unwrap();
        for pair in points.windows(2) {
            assert!(pair[0].distance(pair[1]) <= 1.5 * 1.01);
        }
        assert_eq!(points.first(), path.first().as_ref());
        assert_eq!(points.last(), path.last().as_ref());
    }

    #[test]
    fn test_cap_truncates_tail() {
        let path = polyline(&[(0.0, 0.0, 0.0), (100.0, 0.0, 0.0)]);
        let points = resample(&path, 1.0, 10).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], Vec3::new(0.0, 0.0, 0.0));
        assert!(close(points[9], Vec3::new(9.0, 0.0, 0.0)));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(resample(&Path::empty(), 1.0, 10).unwrap().is_empty());

        let single = polyline(&[(1.0, 2.0, 3.0)]);
        assert_eq!(resample(&single, 1.0, 10).unwrap(), vec![Vec3::new(1.0, 2.0, 3.0)]);

        let path = polyline(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]);
        assert!(matches!(resample(&path, 0.0, 10), Err(VoxtrackError::InvalidRequest(_))));
        assert!(resample(&path, f64::NAN, 10).is_err());
        assert!(resample(&path, 1.0, 1).is_err());
    }

    #[test]
    fn test_decimate_keeps_original_waypoints() {
        let path = polyline(&[
            (0.0, 0.0, 0.0),
            (0.5, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.5, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (2.2, 0.0, 0.0),
        ]);
        let points = decimate(&path, 1.0, 50).unwrap();
        assert_eq!(
            points,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.2, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_decimate_cap() {
        let points: Vec<Vec3> = (0..30).map(|i| Vec3::new(i as f64, 0.0, 0.0)).collect();
        let decimated = decimate(&Path::new(points), 1.0, 5).unwrap();
        assert_eq!(decimated.len(), 5);
        assert_eq!(decimated[4], Vec3::new(4.0, 0.0, 0.0));
    }
}
