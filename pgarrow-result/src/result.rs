use crate::error::Error;

/// Result type alias used throughout pg2arrow.
pub type Result<T> = std::result::Result<T, Error>;
