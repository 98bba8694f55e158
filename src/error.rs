use thiserror::Error;

/// A rejected call to the analysis service.
///
/// Callers don't distinguish between the variants: every rejection is logged
/// and the pending action goes back to idle.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Form input that can't be turned into a [`crate::models::WifiConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("Network name (SSID) is required")]
    MissingSsid,

    #[error("Invalid value for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}
