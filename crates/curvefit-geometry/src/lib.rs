//! curvefit geometry: 3D parametric curves driven by one spline per axis.

pub mod curve;
pub mod settings;
pub mod tessellate;

pub use curve::{Axis, ParametricFunction, ParametricSpline};
pub use settings::CurveSettings;
