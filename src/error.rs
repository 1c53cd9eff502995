//! Errors surfaced by auth operations and API calls.
//!
//! ERROR HANDLING
//! ==============
//! Server rejections and transport failures propagate unchanged to the
//! immediate caller. Nothing here is retried; the caller decides whether to
//! ask the user again. Navigation redirects are outcomes, not errors, and
//! live in `nav`.

// =============================================================================
// API ERROR
// =============================================================================

/// Errors produced by the request pipeline and the auth operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Login rejected by the server. Carries the server message for display.
    #[error("{0}")]
    Auth(String),

    /// Registration rejected by the server.
    #[error("{0}")]
    Registration(String),

    /// Password reset rejected by the server.
    #[error("{0}")]
    Reset(String),

    /// Transport failure or timeout before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success HTTP status.
    #[error("server returned status {status}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The request could not be assembled (bad URL or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Stable machine-readable code for logs and CLI output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "E_AUTH",
            Self::Registration(_) => "E_REGISTRATION",
            Self::Reset(_) => "E_RESET",
            Self::Network(_) => "E_NETWORK",
            Self::Status { .. } => "E_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Map a `reqwest` failure that happened while sending or reading.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::InvalidRequest(err.to_string());
        }
        if err.is_timeout() {
            return Self::Network(format!("request timed out: {err}"));
        }
        Self::Network(err.to_string())
    }
}
