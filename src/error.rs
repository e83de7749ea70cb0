use std::time::Duration;

use thiserror::Error;

/// Errors surfaced synchronously by [`crate::core::session::GameLocator`].
///
/// Per-path I/O failures, timeouts and cancellation are never reported here;
/// they end up in the [`crate::models::scan_result::ScanResult`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("invalid scan options: {0}")]
    InvalidOptions(String),

    #[error("a scan is already in progress")]
    AlreadyScanning,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("invalid match options: {0}")]
    InvalidOptions(String),
}

/// Failure reported by a [`crate::matcher::catalog::CatalogClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog query timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
}
