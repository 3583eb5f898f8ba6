use crate::error::Result;

/// Validate that an entity is complete enough to be evaluated.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
