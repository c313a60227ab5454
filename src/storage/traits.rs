//! Storage Traits
//!
//! Defines the core trait every pipefile storage backend implements.

use async_trait::async_trait;

use super::error::StorageResult;

/// Core trait for pipefile storage backends
///
/// Values are opaque byte payloads stored under string keys. Entries are
/// immutable once written: `put` never overwrites an existing key.
///
/// Every operation is a single round trip to the backend. Dropping the
/// returned future (for instance through `tokio::time::timeout`) aborts the
/// in-flight call; backends add no retries or timers of their own.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get the backend type name (e.g., "memory", "mongodb")
    fn backend_type(&self) -> &'static str;

    /// Read the payload stored under `key`
    ///
    /// Fails with [`StorageError::EntryNotFound`](super::StorageError::EntryNotFound)
    /// when no entry exists.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store a new payload under `key`
    ///
    /// Fails with [`StorageError::DuplicateKey`](super::StorageError::DuplicateKey)
    /// when the key is already taken.
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Release the backend's connections
    ///
    /// Once closed, every further call (including `close`) fails with
    /// [`StorageError::Closed`](super::StorageError::Closed).
    async fn close(&self) -> StorageResult<()>;
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for std::sync::Arc<T> {
    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        (**self).put(key, data).await
    }

    async fn close(&self) -> StorageResult<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Box<T> {
    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        (**self).put(key, data).await
    }

    async fn close(&self) -> StorageResult<()> {
        (**self).close().await
    }
}
