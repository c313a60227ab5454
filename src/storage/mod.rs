//! Pipefile Storage Abstraction
//!
//! This module provides a trait-based abstraction over key-value blob
//! storage. Payloads ("pipefiles") are opaque bytes stored under unique
//! string keys. The in-memory backend is always available; the MongoDB /
//! DocumentDB backend is enabled with the `storage-mongodb` feature.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │       caller        │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │       Storage       │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┐
//!     │             │
//! ┌───▼────┐   ┌────▼────┐
//! │ Memory │   │ MongoDB │
//! │Storage │   │ Storage │
//! └────────┘   └─────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pipefile_storage::storage::{MemoryStorage, Storage, StorageErrorKind};
//!
//! # tokio_test::block_on(async {
//! let storage = MemoryStorage::new();
//!
//! storage.put("a", &[1, 2, 3]).await?;
//! assert_eq!(storage.get("a").await?, vec![1, 2, 3]);
//!
//! let err = storage.get("b").await.unwrap_err();
//! assert_eq!(err.kind(), StorageErrorKind::NotFound);
//!
//! storage.close().await?;
//! # Ok::<(), pipefile_storage::storage::StorageError>(())
//! # }).unwrap();
//! ```

mod error;
mod memory;
mod traits;

pub use error::*;
pub use memory::MemoryStorage;
pub use traits::Storage;

#[cfg(feature = "storage-mongodb")]
mod mongo;

#[cfg(feature = "storage-mongodb")]
pub use mongo::{
    MongoStorage, MongoStorageConfig, MongoStorageCredentials, PipefileRecord, DEFAULT_COLLECTION,
    DEFAULT_DATABASE, DEFAULT_URI,
};
