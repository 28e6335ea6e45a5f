//! Durable key-value store abstraction shared by every execution context

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised by a durable store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A key written by a different execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub key: String,
    /// New value, `None` when the key was removed
    pub value: Option<Vec<u8>>,
}

/// Key-value persistence with change notification.
///
/// Subscribers only hear about writes made by *other* contexts; a context's own
/// `set` never comes back through its own subscription.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Subscribe to changes made by other contexts
    fn subscribe(&self) -> broadcast::Receiver<ExternalChange>;
}
