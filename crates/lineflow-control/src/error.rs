//! Error types for device communication
use lineflow_core::CoreError;
use thiserror::Error;

/// Device session errors
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Token missing, wrong or revoked
    #[error("Device rejected the access token")]
    Auth,

    /// Connection refused or the response made no sense
    #[error("Device unreachable: {0}")]
    DeviceUnreachable(String),

    /// Request deadline passed before the device answered
    #[error("Device did not answer in time: {0}")]
    Timeout(String),

    /// Physical confirmation window closed before a token was issued
    #[error("Pairing window expired. Hold the power button for 5-7 seconds and try again.")]
    PairingTimeout,

    /// Domain error (manual group syntax, malformed frames)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Unexpected status or body from the device
    #[error("API error: {0}")]
    Api(String),

    /// Transport error that is neither a timeout nor a refused connection
    #[error("Network error: {0}")]
    Http(reqwest::Error),

    /// Socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeviceError {
    /// Setup may be retried later for these; the rest need user action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeviceError::DeviceUnreachable(_) | DeviceError::Timeout(_) | DeviceError::Http(_)
        )
    }
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            DeviceError::DeviceUnreachable(err.to_string())
        } else if err.is_timeout() {
            DeviceError::Timeout(err.to_string())
        } else if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            DeviceError::Auth
        } else {
            DeviceError::Http(err)
        }
    }
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;
