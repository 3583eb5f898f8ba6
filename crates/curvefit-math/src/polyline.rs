//! Arc-length measures over ordered point sequences.

use crate::Point3;

/// Running arc length at each vertex, starting at `0.0` for the first.
///
/// The sum is accumulated in a single pass, so entry `i` is exactly the
/// value a caller would get by adding the first `i` segment lengths in order.
pub fn cumulative_lengths(points: &[Point3]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len());
    let mut total = 0.0;
    let mut prev: Option<Point3> = None;
    for &p in points {
        if let Some(q) = prev {
            total += p.distance(q);
        }
        lengths.push(total);
        prev = Some(p);
    }
    lengths
}

/// Length of the segment that closes the loop from the last vertex back to the first.
pub fn closing_length(points: &[Point3]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => last.distance(*first),
        _ => 0.0,
    }
}
