use thiserror::Error;

/// Error type for the dashboard core
///
/// None of these are fatal to the dashboard: fetch failures keep the last
/// good collection, telemetry failures drop the event, storage failures keep
/// the in-memory value.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Transport-level errors (connect, timeout, TLS)
    #[error("Transport error: {message} (url: {url})")]
    Transport { url: String, message: String },

    /// Non-success HTTP status
    #[error("Unexpected status {status} (url: {url})")]
    Status { url: String, status: u16 },

    /// Response body could not be decoded
    #[error("Decode error: {message} (url: {url})")]
    Decode { url: String, message: String },

    /// Preference persistence errors
    #[error("Preference storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Classify a reqwest failure for `url`.
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if let Some(status) = err.status() {
            DashboardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            DashboardError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            DashboardError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Whether the remote side was never reached or never answered
    pub fn is_transport(&self) -> bool {
        matches!(self, DashboardError::Transport { .. })
    }

    /// The URL associated with this error, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            DashboardError::Transport { url, .. } => Some(url),
            DashboardError::Status { url, .. } => Some(url),
            DashboardError::Decode { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Storage(err.to_string())
    }
}
