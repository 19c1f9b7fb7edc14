//! Error types for the SiteWhere client.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because callers
//! usually branch on them. Every other non-2xx response lands in
//! `HttpError` with the raw status and body. None of these originate in the
//! facade itself; they describe what the transport or the server reported.

use thiserror::Error;

/// Errors returned by the SiteWhere client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 for the addressed token.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the session credentials (401 or 403).
    #[error("not authorized (HTTP {status})")]
    Unauthorized { status: u16 },

    /// The server returned any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The session could not be configured.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
