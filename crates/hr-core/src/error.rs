//! Validation error type shared by all `hr-*` crates.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// Errors produced by `hr-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
}

/// Shorthand result type for `hr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
