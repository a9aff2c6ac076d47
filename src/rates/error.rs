//! Rate provider error types.

use crate::core::currency::{CurrencyCode, FxError};
use std::time::Duration;
use thiserror::Error;

/// Failures inside the rate provider.
///
/// These never reach callers of
/// [`RateProvider::get_rates`](crate::rates::provider::RateProvider::get_rates):
/// the provider logs them and falls back to whatever it has cached.
#[derive(Debug, Error)]
pub enum RateError {
    /// The upstream source answered with an error.
    #[error("rate upstream {source_name} failed: {message}")]
    Upstream {
        source_name: String,
        message: String,
    },

    /// The upstream did not answer in time.
    #[error("rate fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream quoted against a different base currency.
    #[error("expected rates quoted against {expected}, got {actual}")]
    BaseMismatch {
        expected: CurrencyCode,
        actual: CurrencyCode,
    },

    /// The rate store could not be read or written.
    #[error("rate store error: {0}")]
    Store(String),

    #[error("reading rates: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing rates: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Fx(#[from] FxError),
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;
