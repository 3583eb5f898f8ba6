//! curvefit 1D splines: piecewise-cubic interpolation of `(t, x)` pairs.
//!
//! Two fitters share the [`Spline`] contract:
//! - [`CardinalSpline`]: C2 cubic spline from a tri-diagonal (or cyclic
//!   tri-diagonal, when closed) solve for the knot derivatives.
//! - [`KochanekSpline`]: Kochanek-Bartels spline whose knot derivatives are
//!   blended from the neighbouring chords by tension, bias and continuity.

pub mod boundary;
pub mod cardinal;
pub mod kind;
pub mod knots;
pub mod kochanek;
pub mod spline;

pub use boundary::{Boundary, Constraint};
pub use cardinal::CardinalSpline;
pub use kind::SplineKind;
pub use knots::ControlPoints;
pub use kochanek::{KochanekParams, KochanekSpline};
pub use spline::{FitInput, SegmentParameter, Spline, SplineState};
