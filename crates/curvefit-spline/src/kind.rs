//! Serializable choice of interpolation basis.

use serde::{Deserialize, Serialize};

use crate::cardinal::CardinalSpline;
use crate::kochanek::{KochanekParams, KochanekSpline};
use crate::spline::Spline;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplineKind {
    #[default]
    Cardinal,
    Kochanek(KochanekParams),
}

impl SplineKind {
    /// A fresh, empty spline of this kind.
    pub fn build(&self) -> Box<dyn Spline> {
        match *self {
            SplineKind::Cardinal => Box::new(CardinalSpline::new()),
            SplineKind::Kochanek(params) => Box::new(KochanekSpline::with_params(params)),
        }
    }
}
