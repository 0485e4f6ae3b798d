//! Error types for the object store.

/// Errors that can occur when moving files in and out of object storage.
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Object key that cannot be used as a storage path
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Object not found
    #[error("object not found: {0}")]
    NotFound(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before uploading.")]
    BucketNotFound(String),
}

/// Result type alias for object store operations.
pub type Result<T> = std::result::Result<T, BlobStoreError>;
