//! Layout error types.

use thiserror::Error;

use notemap_core::CoreError;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// Bad strategy name, dimensionality or tuning parameter.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The run's cancel token was tripped before it settled.
    #[error("layout cancelled")]
    Cancelled,
}

impl LayoutError {
    pub fn is_input_error(&self) -> bool {
        matches!(self, LayoutError::Core(e) if e.is_input_error())
    }
}
