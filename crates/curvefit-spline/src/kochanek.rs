//! Kochanek-Bartels spline.
//!
//! Each interior knot gets an incoming and an outgoing derivative blended
//! from its two neighbouring chords by tension, bias and continuity, then
//! corrected for uneven knot spacing. Segments are cubic Hermite curves in
//! the normalized offset `(t - t[i]) / (t[i + 1] - t[i])`, so derivative
//! boundary values are expressed per unit of that offset.

use serde::{Deserialize, Serialize};

use crate::boundary::{near_ratio_pole, Boundary, Constraint};
use crate::spline::{FitInput, SegmentParameter, Spline, SplineState};

/// Shape parameters shared by every knot, each in `[-1, 1]`.
///
/// Missing fields deserialize as `0.0` and out-of-range values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "UnclampedParams")]
pub struct KochanekParams {
    pub tension: f64,
    pub bias: f64,
    pub continuity: f64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UnclampedParams {
    tension: f64,
    bias: f64,
    continuity: f64,
}

impl From<UnclampedParams> for KochanekParams {
    fn from(raw: UnclampedParams) -> Self {
        Self::new(raw.tension, raw.bias, raw.continuity)
    }
}

impl KochanekParams {
    pub fn new(tension: f64, bias: f64, continuity: f64) -> Self {
        Self {
            tension: tension.clamp(-1.0, 1.0),
            bias: bias.clamp(-1.0, 1.0),
            continuity: continuity.clamp(-1.0, 1.0),
        }
    }

    /// Incoming and outgoing derivative at a knot from the chord arriving at
    /// it (`cs`) and the chord leaving it (`cd`), before spacing correction.
    fn blend(&self, cs: f64, cd: f64) -> (f64, f64) {
        let t = self.tension;
        let b = self.bias;
        let c = self.continuity;
        let incoming = cs * ((1.0 - t) * (1.0 - c) * (1.0 + b)) / 2.0
            + cd * ((1.0 - t) * (1.0 + c) * (1.0 - b)) / 2.0;
        let outgoing = cs * ((1.0 - t) * (1.0 + c) * (1.0 + b)) / 2.0
            + cd * ((1.0 - t) * (1.0 - c) * (1.0 - b)) / 2.0;
        (incoming, outgoing)
    }
}

#[derive(Debug, Clone, Default)]
pub struct KochanekSpline {
    state: SplineState,
    params: KochanekParams,
}

impl KochanekSpline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: KochanekParams) -> Self {
        let mut spline = Self::new();
        spline.set_params(params);
        spline
    }

    pub fn params(&self) -> KochanekParams {
        self.params
    }

    pub fn set_params(&mut self, params: KochanekParams) {
        let params = KochanekParams::new(params.tension, params.bias, params.continuity);
        if self.params != params {
            self.params = params;
            self.state.invalidate();
        }
    }

    pub fn tension(&self) -> f64 {
        self.params.tension
    }

    pub fn bias(&self) -> f64 {
        self.params.bias
    }

    pub fn continuity(&self) -> f64 {
        self.params.continuity
    }

    pub fn set_tension(&mut self, tension: f64) {
        self.set_params(KochanekParams {
            tension,
            ..self.params
        });
    }

    pub fn set_bias(&mut self, bias: f64) {
        self.set_params(KochanekParams { bias, ..self.params });
    }

    pub fn set_continuity(&mut self, continuity: f64) {
        self.set_params(KochanekParams {
            continuity,
            ..self.params
        });
    }
}

impl Spline for KochanekSpline {
    fn state(&self) -> &SplineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SplineState {
        &mut self.state
    }

    fn segment_parameter(&self) -> SegmentParameter {
        SegmentParameter::Normalized
    }

    fn fit(&self, input: &FitInput<'_>) -> Vec<[f64; 4]> {
        let x = input.knots;
        let y = input.values;
        let size = x.len();

        if size == 2 {
            let slope = y[1] - y[0];
            return vec![[y[0], slope, 0.0, 0.0], [y[1], slope, 0.0, 0.0]];
        }

        let last = size - 1;
        let mut incoming = vec![0.0; size];
        let mut outgoing = vec![0.0; size];

        for i in 1..last {
            let (ds, dd) = self.params.blend(y[i] - y[i - 1], y[i + 1] - y[i]);
            let n0 = x[i] - x[i - 1];
            let n1 = x[i + 1] - x[i];
            incoming[i] = ds * (2.0 * n0 / (n0 + n1));
            outgoing[i] = dd * (2.0 * n1 / (n0 + n1));
        }

        if input.closed {
            // The closing knot and the first knot are the same point.
            let (ds, dd) = self.params.blend(y[last] - y[last - 1], y[1] - y[0]);
            let n0 = x[last] - x[last - 1];
            let n1 = x[1] - x[0];
            let ds = ds * (2.0 * n0 / (n0 + n1));
            let dd = dd * (2.0 * n1 / (n0 + n1));
            incoming[0] = ds;
            outgoing[0] = dd;
            incoming[last] = ds;
            outgoing[last] = dd;
        } else {
            outgoing[0] = left_derivative(input.left, y[1] - y[0], incoming[1]);
            let chord = y[last] - y[last - 1];
            incoming[last] = right_derivative(input.right, chord, outgoing[last - 1]);
        }

        let mut coefficients = vec![[0.0; 4]; size];
        for i in 0..last {
            coefficients[i] = [
                y[i],
                outgoing[i],
                -3.0 * y[i] + 3.0 * y[i + 1] - 2.0 * outgoing[i] - incoming[i + 1],
                2.0 * y[i] - 2.0 * y[i + 1] + outgoing[i] + incoming[i + 1],
            ];
        }
        coefficients[last] = [y[last], outgoing[last], incoming[last], 0.0];
        coefficients
    }

    fn clone_box(&self) -> Box<dyn Spline> {
        Box::new(self.clone())
    }
}

/// Outgoing derivative at the first knot. `chord` is `y[1] - y[0]` and
/// `next_incoming` the incoming derivative at knot 1.
fn left_derivative(boundary: Boundary, chord: f64, next_incoming: f64) -> f64 {
    let v = boundary.value;
    match boundary.constraint {
        Constraint::Secant => chord,
        Constraint::FirstDerivative => v,
        Constraint::SecondDerivative => (6.0 * chord - 2.0 * next_incoming - v) / 4.0,
        Constraint::SecondDerivativeRatio if near_ratio_pole(v) => 0.0,
        Constraint::SecondDerivativeRatio => {
            (3.0 * (1.0 + v) * chord - (1.0 + 2.0 * v) * next_incoming) / (2.0 + v)
        }
    }
}

/// Incoming derivative at the last knot. `chord` is `y[N] - y[N-1]` and
/// `prev_outgoing` the outgoing derivative at knot `N-1`.
fn right_derivative(boundary: Boundary, chord: f64, prev_outgoing: f64) -> f64 {
    let v = boundary.value;
    match boundary.constraint {
        Constraint::Secant => chord,
        Constraint::FirstDerivative => v,
        Constraint::SecondDerivative => (6.0 * chord - 2.0 * prev_outgoing + v) / 4.0,
        Constraint::SecondDerivativeRatio if near_ratio_pole(v) => 0.0,
        Constraint::SecondDerivativeRatio => {
            (3.0 * (1.0 + v) * chord - (1.0 + 2.0 * v) * prev_outgoing) / (2.0 + v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn spline_through(points: &[(f64, f64)]) -> KochanekSpline {
        let mut spline = KochanekSpline::new();
        for &(t, x) in points {
            spline.add_point(t, x);
        }
        spline
    }

    #[test]
    fn test_two_points_is_linear() {
        let mut spline = spline_through(&[(1.0, 2.0), (4.0, 8.0)]);
        for i in 0..=30 {
            let t = 1.0 + i as f64 * 0.1;
            let expected = 2.0 + 2.0 * (t - 1.0);
            assert_abs_diff_eq!(spline.evaluate(t).unwrap(), expected, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(spline.derivative(2.0).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolates_knots() {
        let data = [(0.0, 0.0), (1.0, 2.0), (3.0, 1.0), (4.0, 4.0), (6.0, 0.0)];
        for closed in [false, true] {
            let mut spline = spline_through(&data);
            spline.set_closed(closed);
            spline.set_params(KochanekParams::new(0.3, -0.2, 0.5));
            for &(t, x) in &data {
                assert_abs_diff_eq!(spline.evaluate(t).unwrap(), x, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_catmull_rom_tangents() {
        // Zero tension/bias/continuity on uniform knots: tangent is the
        // average of the neighbouring chords.
        let mut spline = spline_through(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0), (3.0, 9.0)]);
        let tangent = spline.derivative(1.0 + 1e-12).unwrap();
        assert_abs_diff_eq!(tangent, 2.0, epsilon = 1e-9);
        let tangent = spline.derivative(2.0 + 1e-12).unwrap();
        assert_abs_diff_eq!(tangent, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_full_tension_flattens_tangents() {
        let mut spline = spline_through(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0), (3.0, 9.0)]);
        spline.set_tension(1.0);
        assert_abs_diff_eq!(spline.derivative(1.0 + 1e-12).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spline.derivative(2.0 - 1e-12).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_params_clamped_and_invalidate() {
        let mut spline = spline_through(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        spline.evaluate(0.5).unwrap();
        assert_eq!(spline.compute_count(), 1);

        spline.set_bias(3.0);
        assert_eq!(spline.bias(), 1.0);
        spline.evaluate(0.5).unwrap();
        assert_eq!(spline.compute_count(), 2);

        spline.set_bias(1.0);
        spline.evaluate(0.5).unwrap();
        assert_eq!(spline.compute_count(), 2);
    }

    #[test]
    fn test_first_derivative_constraint_is_normalized() {
        let mut spline = spline_through(&[(0.0, 0.0), (2.0, 1.0), (4.0, 0.0)]);
        spline.set_left_constraint(Constraint::FirstDerivative);
        spline.set_left_value(1.0);
        // One unit per normalized offset over an interval of width 2.
        assert_abs_diff_eq!(spline.derivative(0.0).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_second_derivative_constraint() {
        let mut spline = spline_through(&[(0.0, 0.0), (1.0, 2.0), (3.0, 1.0), (4.0, 3.0)]);
        spline.set_left_constraint(Constraint::SecondDerivative);
        spline.set_left_value(0.75);
        spline.set_right_constraint(Constraint::SecondDerivative);
        spline.set_right_value(-1.5);
        spline.evaluate(0.0).unwrap();

        let coefficients = spline.state().coefficients().unwrap();
        // Second derivatives per unit of normalized offset.
        assert_abs_diff_eq!(2.0 * coefficients[0][2], 0.75, epsilon = 1e-12);
        let [_, _, c, d] = coefficients[2];
        assert_abs_diff_eq!(2.0 * c + 6.0 * d, -1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_ratio_constraint_scales_neighbour_curvature() {
        let data = [(0.0, 0.0), (1.0, 2.0), (3.0, 1.0), (4.0, 3.0)];
        for v in [1.0, 0.5, -0.75] {
            let mut spline = spline_through(&data);
            spline.set_left_constraint(Constraint::SecondDerivativeRatio);
            spline.set_left_value(v);
            spline.set_right_constraint(Constraint::SecondDerivativeRatio);
            spline.set_right_value(v);
            spline.evaluate(0.0).unwrap();

            let coefficients = spline.state().coefficients().unwrap();
            let [_, _, c0, d0] = coefficients[0];
            let at_start = 2.0 * c0;
            let at_second_knot = 2.0 * c0 + 6.0 * d0;
            assert_abs_diff_eq!(at_start, v * at_second_knot, epsilon = 1e-12);

            let [_, _, c2, d2] = coefficients[2];
            let at_end = 2.0 * c2 + 6.0 * d2;
            let at_third_knot = 2.0 * c2;
            assert_abs_diff_eq!(at_end, v * at_third_knot, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_params_json_defaults_and_clamps() {
        let params: KochanekParams = serde_json::from_str(r#"{"tension": 0.5}"#).unwrap();
        assert_eq!(params, KochanekParams::new(0.5, 0.0, 0.0));

        let params: KochanekParams =
            serde_json::from_str(r#"{"tension": 4.0, "bias": -2.0, "continuity": 0.25}"#).unwrap();
        assert_eq!(params, KochanekParams::new(1.0, -1.0, 0.25));
    }

    #[test]
    fn test_ratio_constraint_at_pole() {
        let mut spline = spline_through(&[(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]);
        spline.set_left_constraint(Constraint::SecondDerivativeRatio);
        spline.set_left_value(-2.0);
        spline.set_right_constraint(Constraint::SecondDerivativeRatio);
        spline.set_right_value(-1.99995);
        assert_abs_diff_eq!(spline.derivative(0.0).unwrap(), 0.0);
        assert_abs_diff_eq!(spline.derivative(2.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_closed_seam_tangent() {
        let mut spline = spline_through(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, -1.0)]);
        spline.set_closed(true);
        assert_abs_diff_eq!(spline.evaluate(4.0).unwrap(), 0.0, epsilon = 1e-12);
        let start = spline.derivative(0.0).unwrap();
        let end = spline.derivative(4.0).unwrap();
        assert_abs_diff_eq!(start, end, epsilon = 1e-12);
    }
}
