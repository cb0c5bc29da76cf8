// src/core/errors.rs

//! Defines the primary error type shared by the repositories, caches and helpers.

use thiserror::Error;

/// The main error enum, representing every failure a store operation can report.
///
/// `NotFound`, `Conflict` and `Authorization` are the domain outcomes. The
/// remaining variants cover the plumbing around them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A referenced identifier or key is absent.
    #[error("entity not found")]
    NotFound,

    /// A uniqueness violation on a key, an identifier or a connection.
    #[error("entity already exists")]
    Conflict,

    /// A membership or connection check failed. "Not connected" and "not
    /// allowed" are reported the same way.
    #[error("missing or invalid credentials provided")]
    Authorization,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The consumer side of the connection bridge is gone, usually because the
    /// store has been shut down.
    #[error("connection bridge is closed")]
    BridgeClosed,

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

// --- From trait implementations for easy error conversion ---

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::HttpClientError(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Internal(format!("JSON serialization/deserialization error: {e}"))
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for StoreError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        StoreError::BridgeClosed
    }
}
