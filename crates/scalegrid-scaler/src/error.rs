//! Error types for the scaling subsystem.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for scaling subsystem operations.
pub type ScalerResult<T> = Result<T, ScalerError>;

/// Errors that can occur while resolving metric values.
///
/// These cross the provider boundary verbatim: the provider facade
/// surfaces them to the host API without rewrapping, so the message
/// here is what an operator ultimately sees.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("metric source unreachable: {0}")]
    Connection(String),

    #[error("metric source timed out after {0:?}")]
    Timeout(Duration),

    #[error("metric source returned an unusable payload: {0}")]
    InvalidPayload(String),

    #[error("invalid trigger configuration: {0}")]
    InvalidTrigger(String),
}
