//! Error types surfaced to the host metrics-query API.

use thiserror::Error;

use scalegrid_scaler::ScalerError;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors a provider operation can answer with.
///
/// Resolution failures carry the scaling subsystem's error verbatim:
/// the `Display` text a caller sees is the original cause, not a
/// wrapper around it.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The scaling subsystem could not compute the requested metric.
    #[error(transparent)]
    Resolution(#[from] ScalerError),

    /// The operation is deliberately not implemented by this provider.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Distinguishes "this capability does not exist here" from a
    /// failed resolution.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
