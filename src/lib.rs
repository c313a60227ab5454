//! Pipefile Storage - key-value blob storage over a document database
//!
//! Pipefiles are opaque byte payloads stored under unique string keys. The
//! crate provides:
//!
//! - **`storage`** - the [`Storage`](storage::Storage) trait, the error
//!   taxonomy, an in-memory backend and (with `storage-mongodb`) a
//!   MongoDB/DocumentDB backend
//! - **`config`** - TOML settings and environment overrides (enabled with
//!   the `config` feature)
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! pipefile-storage = { version = "0.1", default-features = false, features = ["storage-mongodb"] }
//! # Or enable everything:
//! pipefile-storage = { version = "0.1", features = ["all"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pipefile_storage::prelude::*;
//!
//! async fn example() -> StorageResult<()> {
//!     let config = MongoStorageConfig::new()
//!         .with_database("pipefile")
//!         .with_collection("pipefile");
//!     let storage = MongoStorage::open(config).await?;
//!
//!     storage.put("a", &[1, 2, 3]).await?;
//!     assert_eq!(storage.get("a").await?, vec![1, 2, 3]);
//!
//!     match storage.get("b").await {
//!         Err(e) if e.kind() == StorageErrorKind::NotFound => {}
//!         other => panic!("unexpected: {:?}", other),
//!     }
//!
//!     storage.close().await
//! }
//! ```

#![warn(missing_docs)]

/// Storage interface and backends
pub mod storage;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::storage::{
        MemoryStorage, Storage, StorageError, StorageErrorKind, StorageResult,
    };

    #[cfg(feature = "storage-mongodb")]
    pub use crate::storage::{MongoStorage, MongoStorageConfig, MongoStorageCredentials};

    #[cfg(feature = "config")]
    pub use crate::config::{EnvironmentLoader, SettingsLoader, StorageSettings};
}
