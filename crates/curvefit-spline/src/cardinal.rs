//! Cardinal (C2 cubic) spline.
//!
//! The first derivative at every knot is found by solving the band system of
//! second-derivative continuity equations. Open splines add one end-condition
//! row per side and use a plain tri-diagonal sweep; closed splines wrap the
//! first and last rows around and are solved as a cyclic tri-diagonal system.
//! Segment cubics are evaluated at the raw offset `t - t[i]`.

use crate::boundary::{near_ratio_pole, Boundary, Constraint};
use crate::spline::{FitInput, SegmentParameter, Spline, SplineState};

#[derive(Debug, Clone, Default)]
pub struct CardinalSpline {
    state: SplineState,
}

impl CardinalSpline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Spline for CardinalSpline {
    fn state(&self) -> &SplineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SplineState {
        &mut self.state
    }

    fn segment_parameter(&self) -> SegmentParameter {
        SegmentParameter::Absolute
    }

    fn fit(&self, input: &FitInput<'_>) -> Vec<[f64; 4]> {
        if input.closed {
            fit_closed(input.knots, input.values)
        } else {
            fit_open(input.knots, input.values, input.left, input.right)
        }
    }

    fn clone_box(&self) -> Box<dyn Spline> {
        Box::new(self.clone())
    }
}

/// One row `lower * D[k-1] + diag * D[k] + upper * D[k+1] = rhs` of the band system.
#[derive(Debug, Clone, Copy, Default)]
struct Row {
    lower: f64,
    diag: f64,
    upper: f64,
    rhs: f64,
}

/// Continuity row for knot `k`, which needs neighbours on both sides.
fn interior_row(x: &[f64], y: &[f64], k: usize) -> Row {
    let xlk = x[k] - x[k - 1];
    let xlkp = x[k + 1] - x[k];
    Row {
        lower: xlkp,
        diag: 2.0 * (xlkp + xlk),
        upper: xlk,
        rhs: 3.0 * ((xlkp * (y[k] - y[k - 1])) / xlk + (xlk * (y[k + 1] - y[k])) / xlkp),
    }
}

/// End-condition row at the left end; `h` and `secant` describe the first interval.
fn left_row(boundary: Boundary, h: f64, secant: f64) -> Row {
    let v = boundary.value;
    match boundary.constraint {
        Constraint::Secant => Row {
            diag: 1.0,
            rhs: secant,
            ..Row::default()
        },
        Constraint::FirstDerivative => Row {
            diag: 1.0,
            rhs: v,
            ..Row::default()
        },
        Constraint::SecondDerivative => Row {
            lower: 0.0,
            diag: 2.0,
            upper: 1.0,
            rhs: 3.0 * secant - 0.5 * h * v,
        },
        Constraint::SecondDerivativeRatio if near_ratio_pole(v) => Row {
            diag: 1.0,
            ..Row::default()
        },
        Constraint::SecondDerivativeRatio => Row {
            lower: 0.0,
            diag: 2.0,
            upper: 4.0 * ((0.5 + v) / (2.0 + v)),
            rhs: 6.0 * ((1.0 + v) / (2.0 + v)) * secant,
        },
    }
}

/// End-condition row at the right end; `h` and `secant` describe the last interval.
fn right_row(boundary: Boundary, h: f64, secant: f64) -> Row {
    let v = boundary.value;
    match boundary.constraint {
        Constraint::Secant => Row {
            diag: 1.0,
            rhs: secant,
            ..Row::default()
        },
        Constraint::FirstDerivative => Row {
            diag: 1.0,
            rhs: v,
            ..Row::default()
        },
        Constraint::SecondDerivative => Row {
            lower: 1.0,
            diag: 2.0,
            upper: 0.0,
            rhs: 3.0 * secant + 0.5 * h * v,
        },
        Constraint::SecondDerivativeRatio if near_ratio_pole(v) => Row {
            diag: 1.0,
            ..Row::default()
        },
        Constraint::SecondDerivativeRatio => Row {
            lower: 4.0 * ((0.5 + v) / (2.0 + v)),
            diag: 2.0,
            upper: 0.0,
            rhs: 6.0 * ((1.0 + v) / (2.0 + v)) * secant,
        },
    }
}

fn fit_open(x: &[f64], y: &[f64], left: Boundary, right: Boundary) -> Vec<[f64; 4]> {
    let size = x.len();
    let last = size - 1;

    // A single segment has no interior curvature for a ratio end to follow.
    let (left, right) = if size == 2 {
        (ratio_as_natural(left), ratio_as_natural(right))
    } else {
        (left, right)
    };

    let mut rows = vec![Row::default(); size];
    let h_left = x[1] - x[0];
    rows[0] = left_row(left, h_left, (y[1] - y[0]) / h_left);
    for k in 1..last {
        rows[k] = interior_row(x, y, k);
    }
    let h_right = x[last] - x[last - 1];
    rows[last] = right_row(right, h_right, (y[last] - y[last - 1]) / h_right);

    let slopes = solve_tridiagonal(&mut rows);
    let mut coefficients = hermite_coefficients(x, y, &slopes);

    // Fictitious cubic at the last knot, continuing the final segment.
    let [_, _, c, d] = coefficients[last - 1];
    coefficients[last] = [y[last], slopes[last], c + 3.0 * d * h_right, d];
    coefficients
}

fn ratio_as_natural(boundary: Boundary) -> Boundary {
    match boundary.constraint {
        Constraint::SecondDerivativeRatio => Boundary::second_derivative(0.0),
        _ => boundary,
    }
}

fn fit_closed(x: &[f64], y: &[f64]) -> Vec<[f64; 4]> {
    let n = x.len() - 1;

    let mut rows = vec![Row::default(); n + 1];
    for k in 1..n {
        rows[k] = interior_row(x, y, k);
    }
    // The row of the closing knot wraps onto the first interval.
    let xlk = x[n] - x[n - 1];
    let xlkp = x[1] - x[0];
    rows[n] = Row {
        lower: xlkp,
        diag: 2.0 * (xlkp + xlk),
        upper: xlk,
        rhs: 3.0 * ((xlkp * (y[n] - y[n - 1])) / xlk + (xlk * (y[1] - y[0])) / xlkp),
    };

    let slopes = solve_cyclic(&mut rows);
    let mut coefficients = hermite_coefficients(x, y, &slopes);

    // The closing knot carries the first segment's cubic.
    coefficients[n] = coefficients[0];
    coefficients
}

/// Thomas sweep over `rows`; the upper term of the last row and the lower
/// term of the first are ignored. Returns the solution vector.
fn solve_tridiagonal(rows: &mut [Row]) -> Vec<f64> {
    let size = rows.len();
    let last = size - 1;

    rows[0].upper /= rows[0].diag;
    rows[0].rhs /= rows[0].diag;
    rows[last].upper = 0.0;

    for k in 1..size {
        let (prev_upper, prev_rhs) = (rows[k - 1].upper, rows[k - 1].rhs);
        let row = &mut rows[k];
        row.diag -= row.lower * prev_upper;
        row.upper /= row.diag;
        row.rhs = (row.rhs - row.lower * prev_rhs) / row.diag;
    }

    for k in (0..last).rev() {
        let next = rows[k + 1].rhs;
        rows[k].rhs -= rows[k].upper * next;
    }

    rows.iter().map(|row| row.rhs).collect()
}

/// Solve the cyclic system whose row `0` is a placeholder and whose row `n`
/// couples `D[n-1]`, `D[n]` and `D[1]`, with `D[0] == D[n]`.
///
/// The sweep tracks the solution as `D[k] = p[k] * D[n] + q[k]` and then
/// closes the loop with the unreduced wrap row.
fn solve_cyclic(rows: &mut [Row]) -> Vec<f64> {
    let n = rows.len() - 1;
    let wrap = rows[n];

    rows[0].upper = 0.0;
    rows[0].rhs = 0.0;
    let mut homogeneous = vec![0.0; n + 1];
    homogeneous[0] = 1.0;

    for k in 1..=n {
        let (prev_upper, prev_rhs) = (rows[k - 1].upper, rows[k - 1].rhs);
        let row = &mut rows[k];
        row.diag -= row.lower * prev_upper;
        row.upper /= row.diag;
        row.rhs = (row.rhs - row.lower * prev_rhs) / row.diag;
        homogeneous[k] = (-1.0 * row.lower * homogeneous[k - 1]) / row.diag;
    }

    let mut p = vec![0.0; n + 1];
    let mut q = vec![0.0; n + 1];
    p[n] = 1.0;
    q[n] = 0.0;
    for k in (1..n).rev() {
        p[k] = homogeneous[k] - rows[k].upper * p[k + 1];
        q[k] = rows[k].rhs - rows[k].upper * q[k + 1];
    }

    let seam = (wrap.rhs - wrap.upper * q[1] - wrap.lower * q[n - 1])
        / (wrap.diag + wrap.upper * p[1] + wrap.lower * p[n - 1]);

    let mut slopes = vec![0.0; n + 1];
    slopes[0] = seam;
    slopes[n] = seam;
    for k in 1..n {
        slopes[k] = p[k] * seam + q[k];
    }
    slopes
}

/// Power-basis cubics in `t - t[k]` from knot values and slopes. The row of
/// the last knot is left zeroed for the caller to fill.
fn hermite_coefficients(x: &[f64], y: &[f64], slopes: &[f64]) -> Vec<[f64; 4]> {
    let size = x.len();
    let mut coefficients = vec![[0.0; 4]; size];
    for k in 0..size - 1 {
        let b = x[k + 1] - x[k];
        coefficients[k] = [
            y[k],
            slopes[k],
            (3.0 * (y[k + 1] - y[k])) / (b * b) - (slopes[k + 1] + 2.0 * slopes[k]) / b,
            (2.0 * (y[k] - y[k + 1])) / (b * b * b) + (slopes[k + 1] + slopes[k]) / (b * b),
        ];
    }
    coefficients
}
