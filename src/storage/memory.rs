//! In-Memory Storage Backend
//!
//! Process-local backend with the same contract as the database backends.
//! Used for tests and for components that need a storage value without a
//! running database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::error::{StorageError, StorageResult};
use super::traits::Storage;

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    closed: AtomicBool,
}

impl MemoryStorage {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no entries are stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.ensure_open()?;

        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;

        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Err(StorageError::DuplicateKey {
                key: key.to_string(),
                source: format!("an entry with key `{}` already exists", key).into(),
            });
        }
        entries.insert(key.to_string(), data.to_vec());

        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StorageError::Closed);
        }
        self.entries.write().await.clear();
        Ok(())
    }
}
