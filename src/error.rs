//! Error types for gerritka.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation.

use thiserror::Error;

/// Errors from talking to the Gerrit REST API.
#[derive(Error, Debug)]
pub enum GerritError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Gerrit returned {status} for '{path}'")]
    Status {
        status: reqwest::StatusCode,
        path: String,
    },

    #[error("malformed JSON from Gerrit: {0}")]
    Json(#[from] serde_json::Error),

    #[error("patch payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("patch payload is not valid UTF-8")]
    PatchEncoding,

    #[error("401 response carries no WWW-Authenticate challenge")]
    MissingChallenge,

    #[error("401 challenge is not a digest challenge: '{header}'")]
    NotDigestChallenge { header: String },
}

/// Authentication negotiation errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Gerrit unreachable during authentication probe: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("authentication probe failed: {0}")]
    Probe(#[source] GerritError),

    #[error("Gerrit rejected all authentication schemes (digest, basic, cookie)")]
    AllSchemesRejected,
}

/// Change-URL resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("could not extract change ID from URL: {input}")]
    NoChangeId { input: String },
}

/// Result type alias for Gerrit REST operations.
pub type GerritResult<T> = std::result::Result<T, GerritError>;

// Error code implementations for machine-readable error responses
impl GerritError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Url(_) => "URL_ERROR",
            Self::Status { .. } => "GERRIT_STATUS",
            Self::Json(_) => "JSON_ERROR",
            Self::Base64(_) => "BASE64_ERROR",
            Self::PatchEncoding => "PATCH_ENCODING",
            Self::MissingChallenge => "MISSING_CHALLENGE",
            Self::NotDigestChallenge { .. } => "NOT_DIGEST_CHALLENGE",
        }
    }
}

impl AuthError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "GERRIT_UNREACHABLE",
            Self::Probe(_) => "AUTH_PROBE_FAILED",
            Self::AllSchemesRejected => "AUTH_REJECTED",
        }
    }
}

impl ResolveError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoChangeId { .. } => "NO_CHANGE_ID",
        }
    }
}
