//! The shared spline contract and the lazily refitted state behind it.

use std::fmt;

use curvefit_core::{CurveError, Result};

use crate::boundary::{Boundary, Constraint};
use crate::knots::{find_interval, ControlPoints};

/// How the offset into a segment is measured when a cubic is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentParameter {
    /// `dt = t - t[i]`.
    Absolute,
    /// `dt = (t - t[i]) / (t[i + 1] - t[i])`, always in `[0, 1]`.
    Normalized,
}

/// Everything a fitter needs to produce coefficients.
///
/// When `closed` is set, `knots` and `values` already include the synthetic
/// closing knot whose value repeats the first one.
#[derive(Debug, Clone, Copy)]
pub struct FitInput<'a> {
    pub knots: &'a [f64],
    pub values: &'a [f64],
    pub closed: bool,
    pub left: Boundary,
    pub right: Boundary,
}

/// Coefficients matching one configuration of a [`SplineState`].
#[derive(Debug, Clone)]
struct Fit {
    knots: Vec<f64>,
    /// `[a, b, c, d]` per knot; the row of the last knot is never evaluated.
    coefficients: Vec<[f64; 4]>,
}

impl Fit {
    fn locate(&self, t: f64, parameter: SegmentParameter) -> (usize, f64, f64) {
        let last = self.knots.len() - 1;
        let t = t.clamp(self.knots[0], self.knots[last]);
        let index = find_interval(&self.knots, t);
        let width = self.knots[index + 1] - self.knots[index];
        let offset = match parameter {
            SegmentParameter::Absolute => t - self.knots[index],
            SegmentParameter::Normalized => (t - self.knots[index]) / width,
        };
        (index, offset, width)
    }

    fn value(&self, t: f64, parameter: SegmentParameter) -> f64 {
        let (index, s, _) = self.locate(t, parameter);
        let [a, b, c, d] = self.coefficients[index];
        s * (s * (s * d + c) + b) + a
    }

    fn slope(&self, t: f64, parameter: SegmentParameter) -> f64 {
        let (index, s, width) = self.locate(t, parameter);
        let [_, b, c, d] = self.coefficients[index];
        let slope = s * (3.0 * d * s + 2.0 * c) + b;
        match parameter {
            SegmentParameter::Absolute => slope,
            SegmentParameter::Normalized => slope / width,
        }
    }
}

/// Control points and end conditions of a spline, plus its cached fit.
///
/// Every mutator that changes the configuration drops the cached fit; the
/// next evaluation rebuilds it. A present fit always matches the current
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct SplineState {
    points: ControlPoints,
    closed: bool,
    left: Boundary,
    right: Boundary,
    parametric_range: Option<(f64, f64)>,
    fit: Option<Fit>,
    compute_count: u64,
}

impl SplineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &ControlPoints {
        &self.points
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn add_point(&mut self, t: f64, x: f64) {
        if self.points.insert(t, x) {
            self.invalidate();
        } else {
            log::warn!("ignoring spline point with non-finite parameter {t}");
        }
    }

    pub fn remove_point(&mut self, t: f64) {
        if self.points.remove(t).is_some() {
            self.invalidate();
        }
    }

    pub fn remove_all_points(&mut self) {
        self.points.clear();
        self.invalidate();
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.invalidate();
        }
    }

    pub fn left(&self) -> Boundary {
        self.left
    }

    pub fn right(&self) -> Boundary {
        self.right
    }

    pub fn set_left_constraint(&mut self, constraint: Constraint) {
        if self.left.constraint != constraint {
            self.left.constraint = constraint;
            self.invalidate();
        }
    }

    pub fn set_right_constraint(&mut self, constraint: Constraint) {
        if self.right.constraint != constraint {
            self.right.constraint = constraint;
            self.invalidate();
        }
    }

    pub fn set_left_value(&mut self, value: f64) {
        if self.left.value != value {
            self.left.value = value;
            self.invalidate();
        }
    }

    pub fn set_right_value(&mut self, value: f64) {
        if self.right.value != value {
            self.right.value = value;
            self.invalidate();
        }
    }

    /// Set the parameter range; for a closed spline `max` becomes the
    /// parameter of the closing knot.
    pub fn set_parametric_range(&mut self, min: f64, max: f64) {
        if self.parametric_range != Some((min, max)) {
            self.parametric_range = Some((min, max));
            self.invalidate();
        }
    }

    /// The explicit range if one was set, otherwise the span of the knots.
    pub fn parametric_range(&self) -> (f64, f64) {
        if let Some(range) = self.parametric_range {
            return range;
        }
        match (self.points.first(), self.points.last()) {
            (Some((t0, _)), Some((t1, _))) => (t0, t1),
            _ => (0.0, 0.0),
        }
    }

    /// Drop the cached fit.
    pub fn invalidate(&mut self) {
        self.fit = None;
    }

    /// Whether the cached fit matches the current configuration.
    pub fn is_fresh(&self) -> bool {
        self.fit.is_some()
    }

    /// Cached `[a, b, c, d]` rows, one per fitted knot.
    pub fn coefficients(&self) -> Option<&[[f64; 4]]> {
        self.fit.as_ref().map(|fit| fit.coefficients.as_slice())
    }

    /// Number of fits computed so far.
    pub fn compute_count(&self) -> u64 {
        self.compute_count
    }

    /// Knots and values handed to the fitter, including the closing knot of
    /// a closed spline. Requires at least one point.
    fn fit_knots(&self) -> (Vec<f64>, Vec<f64>) {
        let (mut knots, mut values) = self.points.split();
        if self.closed {
            if let (Some(&last), Some(&first)) = (knots.last(), values.first()) {
                let closing = match self.parametric_range {
                    Some((min, max)) if min != max && max > last => max,
                    _ => last + 1.0,
                };
                knots.push(closing);
                values.push(first);
            }
        }
        (knots, values)
    }

    fn store_fit(&mut self, knots: Vec<f64>, coefficients: Vec<[f64; 4]>) {
        self.fit = Some(Fit {
            knots,
            coefficients,
        });
        self.compute_count += 1;
    }
}

/// A piecewise-cubic interpolant of sorted `(t, x)` pairs.
///
/// Implementors supply the fitting rule and the segment convention; the
/// provided methods handle storage, invalidation, lazy refits, clamping and
/// Horner evaluation.
pub trait Spline: fmt::Debug + Send {
    fn state(&self) -> &SplineState;

    fn state_mut(&mut self) -> &mut SplineState;

    /// How the offset into a segment is measured by this fitter's coefficients.
    fn segment_parameter(&self) -> SegmentParameter;

    /// Produce one `[a, b, c, d]` row per knot. `input` holds at least two knots.
    fn fit(&self, input: &FitInput<'_>) -> Vec<[f64; 4]>;

    /// Independent boxed copy, including the cached fit.
    fn clone_box(&self) -> Box<dyn Spline>;

    fn add_point(&mut self, t: f64, x: f64) {
        self.state_mut().add_point(t, x);
    }

    fn remove_point(&mut self, t: f64) {
        self.state_mut().remove_point(t);
    }

    fn remove_all_points(&mut self) {
        self.state_mut().remove_all_points();
    }

    fn number_of_points(&self) -> usize {
        self.state().number_of_points()
    }

    fn control_points(&self) -> &ControlPoints {
        self.state().points()
    }

    fn closed(&self) -> bool {
        self.state().closed()
    }

    fn set_closed(&mut self, closed: bool) {
        self.state_mut().set_closed(closed);
    }

    fn left_constraint(&self) -> Constraint {
        self.state().left().constraint
    }

    fn right_constraint(&self) -> Constraint {
        self.state().right().constraint
    }

    fn left_value(&self) -> f64 {
        self.state().left().value
    }

    fn right_value(&self) -> f64 {
        self.state().right().value
    }

    fn set_left_constraint(&mut self, constraint: Constraint) {
        self.state_mut().set_left_constraint(constraint);
    }

    fn set_right_constraint(&mut self, constraint: Constraint) {
        self.state_mut().set_right_constraint(constraint);
    }

    fn set_left_value(&mut self, value: f64) {
        self.state_mut().set_left_value(value);
    }

    fn set_right_value(&mut self, value: f64) {
        self.state_mut().set_right_value(value);
    }

    fn set_parametric_range(&mut self, min: f64, max: f64) {
        self.state_mut().set_parametric_range(min, max);
    }

    fn parametric_range(&self) -> (f64, f64) {
        self.state().parametric_range()
    }

    fn compute_count(&self) -> u64 {
        self.state().compute_count()
    }

    /// Rebuild the coefficients from the current configuration.
    fn compute(&mut self) -> Result<()> {
        let state = self.state();
        let count = state.number_of_points();
        if count < 2 {
            return Err(CurveError::TooFewPoints {
                required: 2,
                actual: count,
            });
        }

        let (knots, values) = state.fit_knots();
        let coefficients = self.fit(&FitInput {
            knots: &knots,
            values: &values,
            closed: state.closed(),
            left: state.left(),
            right: state.right(),
        });
        log::debug!(
            "fitted {} spline segments (closed: {})",
            knots.len() - 1,
            state.closed()
        );
        self.state_mut().store_fit(knots, coefficients);
        Ok(())
    }

    /// Fitted value at `t`, clamped into the knot range.
    ///
    /// Fails with [`CurveError::TooFewPoints`] when fewer than two points are
    /// present.
    fn evaluate(&mut self, t: f64) -> Result<f64> {
        let parameter = self.segment_parameter();
        ensure_fit(self)?;
        fitted(self.state()).map(|fit| fit.value(t, parameter))
    }

    /// First derivative of the fitted curve with respect to `t`.
    fn derivative(&mut self, t: f64) -> Result<f64> {
        let parameter = self.segment_parameter();
        ensure_fit(self)?;
        fitted(self.state()).map(|fit| fit.slope(t, parameter))
    }

    /// [`Spline::evaluate`], falling back to `0.0` after logging the error.
    fn evaluate_or_zero(&mut self, t: f64) -> f64 {
        self.evaluate(t).unwrap_or(0.0)
    }
}

impl Clone for Box<dyn Spline> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn ensure_fit<S: Spline + ?Sized>(spline: &mut S) -> Result<()> {
    let count = spline.number_of_points();
    if count < 2 {
        let err = CurveError::TooFewPoints {
            required: 2,
            actual: count,
        };
        log::warn!("cannot evaluate spline: {err}");
        return Err(err);
    }
    if !spline.state().is_fresh() {
        spline.compute()?;
    }
    Ok(())
}

fn fitted(state: &SplineState) -> Result<&Fit> {
    state
        .fit
        .as_ref()
        .ok_or_else(|| CurveError::InvalidOperation("spline has no fitted coefficients".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutators_invalidate_only_on_change() {
        let mut state = SplineState::new();
        state.add_point(0.0, 1.0);
        state.add_point(1.0, 2.0);
        state.store_fit(vec![0.0, 1.0], vec![[1.0, 1.0, 0.0, 0.0]; 2]);
        assert!(state.is_fresh());

        state.set_closed(false);
        state.set_left_constraint(Constraint::Secant);
        state.set_left_value(0.0);
        assert!(state.is_fresh());

        state.set_right_value(2.5);
        assert!(!state.is_fresh());
    }

    #[test]
    fn test_remove_missing_point_keeps_fit() {
        let mut state = SplineState::new();
        state.add_point(0.0, 1.0);
        state.store_fit(vec![0.0, 1.0], vec![[1.0, 0.0, 0.0, 0.0]; 2]);
        state.remove_point(3.0);
        assert!(state.is_fresh());
        state.remove_point(0.0);
        assert!(!state.is_fresh());
    }

    #[test]
    fn test_closing_knot() {
        let mut state = SplineState::new();
        state.add_point(0.0, 5.0);
        state.add_point(2.0, 7.0);
        state.set_closed(true);
        assert_eq!(state.fit_knots(), (vec![0.0, 2.0, 3.0], vec![5.0, 7.0, 5.0]));

        state.set_parametric_range(0.0, 4.5);
        assert_eq!(state.fit_knots().0, vec![0.0, 2.0, 4.5]);

        // A range ending inside the knots cannot place the closing knot.
        state.set_parametric_range(0.0, 1.0);
        assert_eq!(state.fit_knots().0, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parametric_range_default() {
        let mut state = SplineState::new();
        assert_eq!(state.parametric_range(), (0.0, 0.0));
        state.add_point(-1.0, 0.0);
        state.add_point(3.0, 0.0);
        assert_eq!(state.parametric_range(), (-1.0, 3.0));
    }

    #[test]
    fn test_fit_evaluation_conventions() {
        let fit = Fit {
            knots: vec![0.0, 2.0],
            coefficients: vec![[1.0, 1.0, 0.0, 0.0], [3.0, 0.0, 0.0, 0.0]],
        };
        assert_eq!(fit.value(1.0, SegmentParameter::Absolute), 2.0);
        assert_eq!(fit.value(1.0, SegmentParameter::Normalized), 1.5);
        assert_eq!(fit.slope(1.0, SegmentParameter::Absolute), 1.0);
        assert_eq!(fit.slope(1.0, SegmentParameter::Normalized), 0.5);
        // Clamped at both ends
        assert_eq!(fit.value(-4.0, SegmentParameter::Absolute), 1.0);
        assert_eq!(fit.value(10.0, SegmentParameter::Absolute), 3.0);
    }
}
