//! Error types for metadata parsing and retrieval.

use thiserror::Error;

/// Errors produced while decoding a raw metadata blob.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload is not a JSON object.
    #[error("malformed metadata JSON: {0}")]
    MalformedJson(String),

    /// A required section is absent (or `null`).
    #[error("metadata section missing: {path}")]
    MissingSection { path: String },

    /// A section is present but has the wrong shape.
    #[error("invalid metadata section {path}: {reason}")]
    InvalidSection { path: String, reason: String },
}

/// Errors from reading the metadata slot of a host entity.
#[derive(Debug, Error)]
pub enum MetadataStoreError {
    /// The storage schema is not registered in the host document.
    #[error("storage schema not registered: {0}")]
    SchemaNotFound(uuid::Uuid),

    /// The host could not be queried.
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}
