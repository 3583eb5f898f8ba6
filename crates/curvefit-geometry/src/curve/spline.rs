//! 3D curve through an ordered point sequence, one 1D spline per axis.

use curvefit_core::{CurveError, Result, Validate};
use curvefit_math::{polyline, DVec3, Point3, Vector3};
use curvefit_spline::{Boundary, CardinalSpline, Constraint, Spline};

use super::{Axis, ParametricFunction};
use crate::settings::CurveSettings;

/// Maps `u` in `[0, 1]` onto an interpolating spline through `points`.
///
/// Each control point gets a knot `t` equal to its index, or to the
/// cumulative chord length from the first point when parameterized by
/// length. The three axis splines are rebuilt from the control points lazily,
/// on the first evaluation after any change.
#[derive(Debug, Clone)]
pub struct ParametricSpline {
    splines: [Option<Box<dyn Spline>>; 3],
    points: Vec<Point3>,
    closed: bool,
    parameterize_by_length: bool,
    left: Boundary,
    right: Boundary,
    length: f64,
    closed_length: f64,
    initialized: bool,
    initialize_count: u64,
}

impl Default for ParametricSpline {
    fn default() -> Self {
        Self::new()
    }
}

impl ParametricSpline {
    /// An empty, open, length-parameterized curve over cardinal splines.
    pub fn new() -> Self {
        let settings = CurveSettings::default();
        Self {
            splines: [
                Some(Box::new(CardinalSpline::new())),
                Some(Box::new(CardinalSpline::new())),
                Some(Box::new(CardinalSpline::new())),
            ],
            points: Vec::new(),
            closed: settings.closed,
            parameterize_by_length: settings.parameterize_by_length,
            left: settings.left,
            right: settings.right,
            length: 0.0,
            closed_length: 0.0,
            initialized: false,
            initialize_count: 0,
        }
    }

    pub fn with_settings(settings: &CurveSettings) -> Self {
        let mut curve = Self::new();
        curve.apply_settings(settings);
        curve
    }

    /// Adopt `settings`, replacing all three axis splines with fresh ones of
    /// the configured kind.
    pub fn apply_settings(&mut self, settings: &CurveSettings) {
        self.closed = settings.closed;
        self.parameterize_by_length = settings.parameterize_by_length;
        self.left = settings.left;
        self.right = settings.right;
        for slot in &mut self.splines {
            *slot = Some(settings.spline.build());
        }
        self.mark_stale();
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.mark_stale();
        }
    }

    pub fn parameterize_by_length(&self) -> bool {
        self.parameterize_by_length
    }

    pub fn set_parameterize_by_length(&mut self, by_length: bool) {
        if self.parameterize_by_length != by_length {
            self.parameterize_by_length = by_length;
            self.mark_stale();
        }
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    /// Replace the control points.
    pub fn set_points(&mut self, points: impl Into<Vec<Point3>>) {
        self.points = points.into();
        self.mark_stale();
    }

    /// Resize the control point sequence; new points start at the origin.
    pub fn set_number_of_points(&mut self, count: usize) {
        self.points.resize(count, DVec3::ZERO);
        self.mark_stale();
    }

    pub fn set_point(&mut self, index: usize, point: Point3) -> Result<()> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(CurveError::PointIndexOutOfRange { index, len })?;
        *slot = point;
        self.mark_stale();
        Ok(())
    }

    pub fn spline(&self, axis: Axis) -> Option<&dyn Spline> {
        self.splines[axis.index()].as_deref()
    }

    /// Mutable access to an axis spline. The curve is re-initialized on the
    /// next evaluation.
    pub fn spline_mut(&mut self, axis: Axis) -> Option<&mut (dyn Spline + 'static)> {
        self.mark_stale();
        self.splines[axis.index()].as_deref_mut()
    }

    /// Replace the interpolator for one axis, returning the previous one.
    pub fn set_spline(&mut self, axis: Axis, spline: Box<dyn Spline>) -> Option<Box<dyn Spline>> {
        self.mark_stale();
        self.splines[axis.index()].replace(spline)
    }

    /// Remove the interpolator for one axis. Evaluation fails until a
    /// replacement is set.
    pub fn take_spline(&mut self, axis: Axis) -> Option<Box<dyn Spline>> {
        self.mark_stale();
        self.splines[axis.index()].take()
    }

    pub fn set_x_spline(&mut self, spline: Box<dyn Spline>) -> Option<Box<dyn Spline>> {
        self.set_spline(Axis::X, spline)
    }

    pub fn set_y_spline(&mut self, spline: Box<dyn Spline>) -> Option<Box<dyn Spline>> {
        self.set_spline(Axis::Y, spline)
    }

    pub fn set_z_spline(&mut self, spline: Box<dyn Spline>) -> Option<Box<dyn Spline>> {
        self.set_spline(Axis::Z, spline)
    }

    pub fn left_constraint(&self) -> Constraint {
        self.left.constraint
    }

    pub fn right_constraint(&self) -> Constraint {
        self.right.constraint
    }

    pub fn left_value(&self) -> f64 {
        self.left.value
    }

    pub fn right_value(&self) -> f64 {
        self.right.value
    }

    pub fn set_left_constraint(&mut self, constraint: Constraint) {
        self.left.constraint = constraint;
        self.mark_stale();
    }

    pub fn set_right_constraint(&mut self, constraint: Constraint) {
        self.right.constraint = constraint;
        self.mark_stale();
    }

    pub fn set_left_value(&mut self, value: f64) {
        self.left.value = value;
        self.mark_stale();
    }

    pub fn set_right_value(&mut self, value: f64) {
        self.right.value = value;
        self.mark_stale();
    }

    /// Length of the open curve's parameter span as of the last initialization.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Parameter span including the closing segment, as of the last initialization.
    pub fn closed_length(&self) -> f64 {
        self.closed_length
    }

    /// Number of times the axis splines have been rebuilt.
    pub fn initialize_count(&self) -> u64 {
        self.initialize_count
    }

    fn mark_stale(&mut self) {
        self.initialized = false;
    }

    /// Rebuild the three axis splines from the control points.
    pub fn initialize(&mut self) -> Result<()> {
        if let Err(err) = self.validate() {
            log::warn!("cannot initialize parametric spline: {err}");
            return Err(err);
        }

        let (closed, left, right) = (self.closed, self.left, self.right);
        for spline in self.splines.iter_mut().flatten() {
            spline.set_closed(closed);
            spline.set_left_constraint(left.constraint);
            spline.set_right_constraint(right.constraint);
            spline.set_left_value(left.value);
            spline.set_right_value(right.value);
        }

        let count = self.points.len();
        let params: Vec<f64> = if self.parameterize_by_length {
            polyline::cumulative_lengths(&self.points)
        } else {
            (0..count).map(|i| i as f64).collect()
        };
        self.length = params.last().copied().unwrap_or(0.0);
        self.closed_length = if self.parameterize_by_length {
            self.length + polyline::closing_length(&self.points)
        } else {
            count as f64
        };

        // A single point, or only coincident points, evaluates to the first point.
        if count == 1 || self.length == 0.0 {
            self.length = 0.0;
            self.closed_length = 0.0;
            for spline in self.splines.iter_mut().flatten() {
                spline.remove_all_points();
            }
            self.finish_initialize(count);
            return Ok(());
        }

        let span = if closed { self.closed_length } else { self.length };
        for spline in self.splines.iter_mut().flatten() {
            spline.set_parametric_range(0.0, span);
            spline.remove_all_points();
        }
        for (&t, &p) in params.iter().zip(&self.points) {
            for (axis, slot) in Axis::ALL.into_iter().zip(self.splines.iter_mut()) {
                if let Some(spline) = slot {
                    spline.add_point(t, axis.component(p));
                }
            }
        }

        self.finish_initialize(count);
        Ok(())
    }

    fn finish_initialize(&mut self, count: usize) {
        self.initialized = true;
        self.initialize_count += 1;
        log::debug!(
            "initialized parametric spline: {} points, length {}, closed length {}",
            count,
            self.length,
            self.closed_length
        );
    }

    fn ensure_initialized(&mut self) -> Result<()> {
        if !self.initialized {
            self.initialize()?;
        }
        Ok(())
    }

    /// Spline parameter for `u`, or `None` when the curve collapses to its
    /// first point.
    fn knot_parameter(&self, u: f64) -> Option<f64> {
        if self.length == 0.0 {
            return None;
        }
        let u = u.clamp(0.0, 1.0);
        let span = if self.closed { self.closed_length } else { self.length };
        Some(u * span)
    }

    fn axis_spline(&mut self, axis: Axis) -> Result<&mut Box<dyn Spline>> {
        self.splines[axis.index()]
            .as_mut()
            .ok_or(CurveError::MissingSpline(axis.name()))
    }

    fn first_point(&self) -> Result<Point3> {
        self.points.first().copied().ok_or(CurveError::NoControlPoints)
    }

    /// Point on the curve at `u`, clamped into `[0, 1]`.
    pub fn evaluate(&mut self, u: f64) -> Result<Point3> {
        self.ensure_initialized()?;
        let Some(t) = self.knot_parameter(u) else {
            return self.first_point();
        };
        let mut out = [0.0; 3];
        for (value, axis) in out.iter_mut().zip(Axis::ALL) {
            *value = self.axis_spline(axis)?.evaluate(t)?;
        }
        Ok(DVec3::from_array(out))
    }

    /// [`ParametricSpline::evaluate`], falling back to the origin after
    /// logging the error.
    pub fn evaluate_or_origin(&mut self, u: f64) -> Point3 {
        self.evaluate(u).unwrap_or(DVec3::ZERO)
    }

    /// Derivative of the curve with respect to `u`.
    pub fn tangent(&mut self, u: f64) -> Result<Vector3> {
        self.ensure_initialized()?;
        let Some(t) = self.knot_parameter(u) else {
            return Ok(DVec3::ZERO);
        };
        let span = if self.closed { self.closed_length } else { self.length };
        let mut out = [0.0; 3];
        for (value, axis) in out.iter_mut().zip(Axis::ALL) {
            *value = self.axis_spline(axis)?.derivative(t)? * span;
        }
        Ok(DVec3::from_array(out))
    }
}

impl Validate for ParametricSpline {
    fn validate(&self) -> Result<()> {
        for axis in Axis::ALL {
            if self.splines[axis.index()].is_none() {
                return Err(CurveError::MissingSpline(axis.name()));
            }
        }
        if self.points.is_empty() {
            return Err(CurveError::NoControlPoints);
        }
        Ok(())
    }
}

impl ParametricFunction for ParametricSpline {
    fn evaluate(&mut self, u: f64) -> Result<Point3> {
        ParametricSpline::evaluate(self, u)
    }

    /// The curve carries no scalar field; the parameter itself is returned.
    fn evaluate_scalar(&mut self, u: f64) -> Result<f64> {
        Ok(u)
    }

    fn joins_ends(&self) -> bool {
        self.closed
    }
}
