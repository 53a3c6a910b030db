//! Error types for the Galaxy3D instancing crate
//!
//! Every error is a programming-contract error: the caller handed in
//! something the visibility engine cannot work with. There is no I/O,
//! so there is no transient/retryable category.

use std::fmt;

/// Result type for Galaxy3D instancing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D instancing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument rejected before any work was done
    /// (unsupported depth convention, non-finite matrix, zero leaf capacity, ...)
    InvalidArgument(String),

    /// Caller broke a documented precondition
    /// (instance in both show and hide, slot out of range, BVH not built, ...)
    PreconditionViolation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::PreconditionViolation(msg) => write!(f, "Precondition violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Build an `Error::InvalidArgument`, logging it at ERROR level first.
///
/// # Example
///
/// ```ignore
/// return Err(engine_err!("galaxy3d::Bvh", "leaf capacity must be > 0"));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::InvalidArgument(message)
    }};
}

/// Build an `Error::PreconditionViolation`, logging it at ERROR level first.
#[macro_export]
macro_rules! engine_precondition {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::PreconditionViolation(message)
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
