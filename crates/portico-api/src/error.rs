use thiserror::Error;

/// Internal error type for the `portico-api` crate.
///
/// The public request surface never hands these to callers directly: every
/// failure is folded into an [`Envelope`](crate::Envelope) at the boundary.
/// They are still public so that client construction and typed decoding of
/// envelope payloads can report what went wrong.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The call was abandoned because its cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    // ── Request ─────────────────────────────────────────────────────
    /// The request descriptor was rejected before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // ── Data ────────────────────────────────────────────────────────
    /// Envelope payload did not match the requested type.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },
}

impl Error {
    /// Human-readable message placed in the `error` field of a status-0
    /// envelope.
    pub(crate) fn envelope_message(&self) -> String {
        match self {
            // reqwest's Display omits the underlying cause (refused, DNS, ...).
            Self::Transport(e) => {
                let mut message = e.to_string();
                let mut source = std::error::Error::source(e);
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                message
            }
            other => other.to_string(),
        }
    }
}
