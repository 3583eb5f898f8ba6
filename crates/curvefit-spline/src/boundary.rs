//! End conditions for open splines.

use serde::{Deserialize, Serialize};

/// How the derivative at an open end of a spline is determined.
///
/// The integer modes `0..=3` of the classic interface map onto the variants
/// in declaration order; see [`Constraint::from_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Mode 0: slope of the chord between the two end knots.
    #[default]
    Secant,
    /// Mode 1: first derivative equals the boundary value.
    FirstDerivative,
    /// Mode 2: second derivative equals the boundary value.
    SecondDerivative,
    /// Mode 3: second derivative is the boundary value times the second
    /// derivative at the adjacent interior knot.
    SecondDerivativeRatio,
}

impl Constraint {
    /// Map an integer mode onto a constraint, clamping into `0..=3`.
    pub fn from_mode(mode: i32) -> Self {
        match mode.clamp(0, 3) {
            0 => Constraint::Secant,
            1 => Constraint::FirstDerivative,
            2 => Constraint::SecondDerivative,
            _ => Constraint::SecondDerivativeRatio,
        }
    }

    pub fn mode(self) -> i32 {
        match self {
            Constraint::Secant => 0,
            Constraint::FirstDerivative => 1,
            Constraint::SecondDerivative => 2,
            Constraint::SecondDerivativeRatio => 3,
        }
    }
}

/// A constraint together with the value it is parameterized by.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Boundary {
    pub constraint: Constraint,
    pub value: f64,
}

impl Boundary {
    pub fn new(constraint: Constraint, value: f64) -> Self {
        Self { constraint, value }
    }

    pub fn secant() -> Self {
        Self::new(Constraint::Secant, 0.0)
    }

    pub fn first_derivative(value: f64) -> Self {
        Self::new(Constraint::FirstDerivative, value)
    }

    pub fn second_derivative(value: f64) -> Self {
        Self::new(Constraint::SecondDerivative, value)
    }

    pub fn second_derivative_ratio(value: f64) -> Self {
        Self::new(Constraint::SecondDerivativeRatio, value)
    }
}

/// Ratio value at which the mode-3 end conditions divide by zero.
const RATIO_POLE: f64 = -2.0;
const RATIO_POLE_GUARD: f64 = 1e-4;

/// Whether a mode-3 ratio lies close enough to `-2.0` that the end derivative
/// must be forced to zero instead of being solved for.
pub(crate) fn near_ratio_pole(value: f64) -> bool {
    value > RATIO_POLE - RATIO_POLE_GUARD && value < RATIO_POLE + RATIO_POLE_GUARD
}
