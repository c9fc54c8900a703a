//! Key-value storage contract and backends
//!
//! The card library persists every record under an opaque string key
//! (`f<N>`, `s<N>`, `c<N>`, plus the three counter keys). Backends only
//! need to provide independent get/set/delete and key enumeration: no
//! transactions, no cascades. The repository layers all consistency work
//! on top of this contract.

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable mapping from string key to string value.
///
/// All operations are asynchronous and independent; partial completion of
/// a multi-key sequence is possible and callers must order writes
/// accordingly. Deleting an absent key is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn list_keys(&self) -> Result<Vec<String>>;
}
