//! Durable store backends

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::{MemoryBackend, MemoryStore};
pub use traits::{DurableStore, ExternalChange, StoreError};

#[cfg(test)]
pub use traits::MockDurableStore;

/// Capacity of the per-context change channel
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;
