use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("Too few points: need at least {required}, have {actual}")]
    TooFewPoints { required: usize, actual: usize },

    #[error("No control points specified")]
    NoControlPoints,

    #[error("No spline assigned to the {0} axis")]
    MissingSpline(&'static str),

    #[error("Point index {index} out of range (have {len} points)")]
    PointIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, CurveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CurveError::TooFewPoints {
            required: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Too few points: need at least 2, have 1");
        assert_eq!(
            CurveError::MissingSpline("y").to_string(),
            "No spline assigned to the y axis"
        );
    }
}
