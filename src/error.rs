//! Error types surfaced by the synchronization layer

use thiserror::Error;

use crate::schema::ValidationErrors;
use crate::storage::StoreError;

/// Failure talking to the durable store or decoding what it holds
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Failed to publish form {id}: {source}")]
    Publish {
        id: String,
        #[source]
        source: StoreError,
    },
    #[error("Corrupt data under key {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Change feed closed")]
    FeedClosed,
}

/// Failure submitting a filled-in form
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("Form is not loaded")]
    NotReady,
    #[error(transparent)]
    Sync(#[from] SyncError),
}
