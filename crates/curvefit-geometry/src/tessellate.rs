//! Tessellation utilities for converting parametric curves to polylines.

use curvefit_core::Result;
use curvefit_math::{Aabb3, Point3};

use crate::curve::ParametricFunction;

/// Evaluate `function` at `resolution + 1` evenly spaced parameters spanning
/// its domain, both ends included.
///
/// For a curve that joins its ends, the last sample repeats the first.
pub fn sample_uniform(
    function: &mut dyn ParametricFunction,
    resolution: usize,
) -> Result<Vec<Point3>> {
    let resolution = resolution.max(1);
    let (u_min, u_max) = function.domain();
    (0..=resolution)
        .map(|i| function.evaluate(u_min + (u_max - u_min) * i as f64 / resolution as f64))
        .collect()
}

/// Convert a curve to a polyline using adaptive subdivision.
///
/// The algorithm recursively subdivides segments where the midpoint deviation
/// from the chord exceeds the given `tolerance`. The first `MIN_DEPTH` levels
/// are always split so that closed curves, whose end chord is degenerate, are
/// not mistaken for flat ones.
///
/// # Arguments
/// * `function` - The curve to tessellate
/// * `tolerance` - Maximum allowed deviation from the true curve
pub fn to_polyline(function: &mut dyn ParametricFunction, tolerance: f64) -> Result<Vec<Point3>> {
    let (u_min, u_max) = function.domain();
    let start = function.evaluate(u_min)?;
    let end = function.evaluate(u_max)?;
    let mut points = vec![start];
    subdivide(function, (u_min, start), (u_max, end), tolerance, &mut points, 0)?;
    Ok(points)
}

/// Bounds of the uniform sample of `function` at `resolution`.
pub fn bounds(function: &mut dyn ParametricFunction, resolution: usize) -> Result<Option<Aabb3>> {
    let points = sample_uniform(function, resolution)?;
    Ok(Aabb3::from_points(&points))
}

/// Levels that are split regardless of deviation.
const MIN_DEPTH: u32 = 2;

/// Maximum recursion depth for adaptive subdivision.
const MAX_DEPTH: u32 = 12;

fn subdivide(
    function: &mut dyn ParametricFunction,
    (u0, p0): (f64, Point3),
    (u1, p1): (f64, Point3),
    tolerance: f64,
    points: &mut Vec<Point3>,
    depth: u32,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        points.push(p1);
        return Ok(());
    }

    let u_mid = (u0 + u1) * 0.5;
    let p_mid = function.evaluate(u_mid)?;
    let deviation = (p_mid - (p0 + p1) * 0.5).length();

    if depth < MIN_DEPTH || deviation > tolerance {
        subdivide(function, (u0, p0), (u_mid, p_mid), tolerance, points, depth + 1)?;
        subdivide(function, (u_mid, p_mid), (u1, p1), tolerance, points, depth + 1)?;
    } else {
        points.push(p1);
    }
    Ok(())
}
