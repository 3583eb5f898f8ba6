//! Sorted knot storage and interval search.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Knot key ordered by `f64::total_cmp`.
#[derive(Debug, Clone, Copy)]
struct Knot(f64);

impl PartialEq for Knot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Knot {}

impl PartialOrd for Knot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Knot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// `(t, x)` control points of a 1D spline, kept sorted by `t`.
///
/// Inserting at an existing `t` overwrites its value.
#[derive(Debug, Clone, Default)]
pub struct ControlPoints {
    map: BTreeMap<Knot, f64>,
}

impl ControlPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the point at `t`. Returns `false` (and stores
    /// nothing) when `t` is not finite.
    pub fn insert(&mut self, t: f64, x: f64) -> bool {
        if !t.is_finite() {
            return false;
        }
        self.map.insert(Knot(canonical(t)), x);
        true
    }

    pub fn remove(&mut self, t: f64) -> Option<f64> {
        self.map.remove(&Knot(canonical(t)))
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Value stored exactly at `t`, if any.
    pub fn value_at(&self, t: f64) -> Option<f64> {
        self.map.get(&Knot(canonical(t))).copied()
    }

    pub fn first(&self) -> Option<(f64, f64)> {
        self.map.first_key_value().map(|(k, &x)| (k.0, x))
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        self.map.last_key_value().map(|(k, &x)| (k.0, x))
    }

    /// Points in ascending `t` order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.map.iter().map(|(k, &x)| (k.0, x))
    }

    /// Split into parallel `(knots, values)` vectors.
    pub fn split(&self) -> (Vec<f64>, Vec<f64>) {
        self.iter().unzip()
    }
}

/// Fold `-0.0` onto `0.0` so both address the same knot.
fn canonical(t: f64) -> f64 {
    t + 0.0
}

/// Find the interval index `i` with `knots[i] <= t <= knots[i + 1]` by bisection.
///
/// A `t` that lies exactly on an interior knot resolves to the interval on
/// its left. `knots` must hold at least two ascending values and `t` must
/// already be clamped into `[knots[0], knots[len - 1]]`.
pub fn find_interval(knots: &[f64], t: f64) -> usize {
    let size = knots.len();
    let mut index = 0;
    if size <= 2 {
        return index;
    }

    let mut right = size - 1;
    let mut center = right - size / 2;
    loop {
        if knots[index] <= t && t <= knots[center] {
            right = center;
        } else {
            index = center;
        }
        if index + 1 == right {
            return index;
        }
        center = index + (right - index) / 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_insert_and_overwrite() {
        let mut points = ControlPoints::new();
        points.insert(2.0, 20.0);
        points.insert(0.0, 0.0);
        points.insert(1.0, 10.0);
        points.insert(1.0, 11.0);

        assert_eq!(points.len(), 3);
        let (knots, values) = points.split();
        assert_eq!(knots, vec![0.0, 1.0, 2.0]);
        assert_eq!(values, vec![0.0, 11.0, 20.0]);
        assert_eq!(points.first(), Some((0.0, 0.0)));
        assert_eq!(points.last(), Some((2.0, 20.0)));
    }

    #[test]
    fn test_negative_zero_is_same_knot() {
        let mut points = ControlPoints::new();
        points.insert(0.0, 1.0);
        points.insert(-0.0, 2.0);
        assert_eq!(points.len(), 1);
        assert_eq!(points.value_at(0.0), Some(2.0));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut points = ControlPoints::new();
        assert!(!points.insert(f64::NAN, 1.0));
        assert!(!points.insert(f64::INFINITY, 1.0));
        assert!(points.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut points = ControlPoints::new();
        points.insert(0.0, 1.0);
        points.insert(1.0, 2.0);
        assert_eq!(points.remove(0.0), Some(1.0));
        assert_eq!(points.remove(5.0), None);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_find_interval() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(find_interval(&knots, 0.0), 0);
        assert_eq!(find_interval(&knots, 0.5), 0);
        assert_eq!(find_interval(&knots, 1.0), 0);
        assert_eq!(find_interval(&knots, 1.5), 1);
        assert_eq!(find_interval(&knots, 2.5), 2);
        assert_eq!(find_interval(&knots, 3.5), 3);
        assert_eq!(find_interval(&knots, 4.0), 3);
    }

    #[test]
    fn test_find_interval_non_uniform() {
        let knots = [0.0, 0.1, 5.0, 5.5, 9.0, 20.0];
        for (i, w) in knots.windows(2).enumerate() {
            let mid = 0.5 * (w[0] + w[1]);
            assert_eq!(find_interval(&knots, mid), i, "midpoint of interval {}", i);
        }
        assert_eq!(find_interval(&[0.0, 1.0], 0.7), 0);
    }
}
