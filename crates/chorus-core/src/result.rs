//! Convenience result type alias for Chorus.

use crate::error::AppError;

/// A specialized `Result` type for Chorus operations.
pub type AppResult<T> = Result<T, AppError>;
