use thiserror::Error;

/// Failures of the pure resolver/normalizer core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed payload in '{section}': {detail}")]
    MalformedPayload { section: &'static str, detail: String },
}

impl CoreError {
    pub(crate) fn malformed(section: &'static str, detail: impl Into<String>) -> Self {
        CoreError::MalformedPayload { section, detail: detail.into() }
    }
}

/// Failures talking to the dashboard backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed with status {status}: {message}")]
    HttpStatus { url: String, status: reqwest::StatusCode, message: String },

    #[error("Failed to parse response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Backend reported an error: {0}")]
    Backend(String),

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Failures of the dashboard orchestration.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
