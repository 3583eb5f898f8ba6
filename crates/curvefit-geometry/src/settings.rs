//! Serializable configuration of a parametric spline.

use curvefit_spline::{Boundary, SplineKind};
use serde::{Deserialize, Serialize};

/// Curve-level options applied to every axis spline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSettings {
    pub closed: bool,
    /// Place knots at cumulative chord length instead of point index.
    pub parameterize_by_length: bool,
    pub left: Boundary,
    pub right: Boundary,
    /// Interpolation basis used for all three axes.
    pub spline: SplineKind,
}

impl Default for CurveSettings {
    fn default() -> Self {
        Self {
            closed: false,
            parameterize_by_length: true,
            left: Boundary::secant(),
            right: Boundary::secant(),
            spline: SplineKind::Cardinal,
        }
    }
}
