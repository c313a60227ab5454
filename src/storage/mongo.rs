//! MongoDB/DocumentDB Storage Backend
//!
//! Stores each pipefile as a `{ key, file_data }` document and relies on a
//! unique index over `key`, created when the backend is opened.
//!
//! ## Usage
//!
//! Enable the `storage-mongodb` feature in Cargo.toml (on by default):
//!
//! ```toml
//! pipefile-storage = { version = "0.1", features = ["storage-mongodb"] }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use pipefile_storage::storage::{MongoStorage, MongoStorageConfig, Storage};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = MongoStorageConfig::new()
//!         .with_uri("mongodb://localhost:27017")
//!         .with_database("pipefile")
//!         .with_collection("pipefile");
//!
//!     let storage = MongoStorage::open(config).await?;
//!     storage.put("a", &[1, 2, 3]).await?;
//!     assert_eq!(storage.get("a").await?, vec![1, 2, 3]);
//!     storage.close().await?;
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use mongodb::{
    bson::{doc, spec::BinarySubtype, Binary},
    error::{ErrorKind, WriteFailure},
    options::{AuthMechanism, ClientOptions, Credential, IndexOptions},
    Client, Collection, IndexModel,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::traits::Storage;

/// Default connection string
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
/// Default database name
pub const DEFAULT_DATABASE: &str = "admin";
/// Default collection name
pub const DEFAULT_COLLECTION: &str = "pipefile";

/// Name of the indexed key field
const KEY_FIELD: &str = "key";
/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Credentials used when connecting
#[derive(Clone, PartialEq, Eq)]
pub struct MongoStorageCredentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
    /// Database holding the user's credentials
    pub auth_source: Option<String>,
    /// Authentication mechanism, e.g. `SCRAM-SHA-256`. Negotiated when unset.
    pub mechanism: Option<String>,
}

impl MongoStorageCredentials {
    /// Create credentials with the given user name and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            auth_source: None,
            mechanism: None,
        }
    }

    /// Set the authentication source database
    pub fn with_auth_source(mut self, auth_source: impl Into<String>) -> Self {
        self.auth_source = Some(auth_source.into());
        self
    }

    /// Set the authentication mechanism
    pub fn with_mechanism(mut self, mechanism: impl Into<String>) -> Self {
        self.mechanism = Some(mechanism.into());
        self
    }

    fn to_credential(&self) -> StorageResult<Credential> {
        let mechanism = self
            .mechanism
            .as_deref()
            .map(AuthMechanism::from_str)
            .transpose()
            .map_err(StorageError::connection)?;

        Ok(Credential::builder()
            .username(self.username.clone())
            .password(self.password.clone())
            .source(self.auth_source.clone())
            .mechanism(mechanism)
            .build())
    }
}

impl Default for MongoStorageCredentials {
    fn default() -> Self {
        Self::new("admin", "admin").with_auth_source("admin")
    }
}

impl fmt::Debug for MongoStorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStorageCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_source", &self.auth_source)
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

/// Connection configuration for [`MongoStorage`]
///
/// Starts from the defaults below; each `with_*` call overrides one field
/// and later calls win.
///
/// | field       | default                     |
/// |-------------|-----------------------------|
/// | uri         | `mongodb://localhost:27017` |
/// | database    | `admin`                     |
/// | collection  | `pipefile`                  |
/// | credentials | `admin` / `admin`, source `admin` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoStorageConfig {
    uri: String,
    database: String,
    collection: String,
    credentials: Option<MongoStorageCredentials>,
    server_selection_timeout: Option<Duration>,
    app_name: Option<String>,
}

impl Default for MongoStorageConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            credentials: Some(MongoStorageCredentials::default()),
            server_selection_timeout: None,
            app_name: None,
        }
    }
}

impl MongoStorageConfig {
    /// Create a configuration holding the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection string
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Authenticate with the given credentials
    pub fn with_authentication(mut self, credentials: MongoStorageCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Connect without explicit credentials (the URI may still carry some)
    pub fn without_authentication(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// Bound how long the driver waits for a usable server
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }

    /// Application name reported to the server
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Connection string
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Database name
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Credentials, if authentication is configured
    pub fn credentials(&self) -> Option<&MongoStorageCredentials> {
        self.credentials.as_ref()
    }

    /// Server selection timeout, if overridden
    pub fn server_selection_timeout(&self) -> Option<Duration> {
        self.server_selection_timeout
    }

    /// Application name, if set
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Build driver options from this configuration
    async fn client_options(&self) -> StorageResult<ClientOptions> {
        let mut options = ClientOptions::parse(self.uri.as_str())
            .await
            .map_err(StorageError::connection)?;

        if let Some(credentials) = &self.credentials {
            options.credential = Some(credentials.to_credential()?);
        }
        if let Some(timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(timeout);
        }
        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }

        Ok(options)
    }
}

/// Persisted pipefile document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipefileRecord {
    /// Unique key
    pub key: String,
    /// Opaque payload, stored verbatim
    pub file_data: Binary,
}

impl PipefileRecord {
    fn new(key: &str, data: &[u8]) -> Self {
        Self {
            key: key.to_string(),
            file_data: Binary {
                subtype: BinarySubtype::Generic,
                bytes: data.to_vec(),
            },
        }
    }
}

/// MongoDB/DocumentDB storage backend
///
/// Only constructed through [`MongoStorage::open`], so every handle has a
/// live client and a unique index on `key`.
pub struct MongoStorage {
    client: Client,
    collection: Collection<PipefileRecord>,
    database_name: String,
    collection_name: String,
    closed: AtomicBool,
}

impl MongoStorage {
    /// Connect and ensure the unique key index exists
    ///
    /// Fails with [`StorageError::Connection`] when the URI is invalid or the
    /// server cannot be reached, and with [`StorageError::IndexCreation`]
    /// when the index cannot be created. No handle is returned on failure.
    pub async fn open(config: MongoStorageConfig) -> StorageResult<Self> {
        let options = config.client_options().await?;
        let client = Client::with_options(options).map_err(StorageError::connection)?;

        // The driver connects lazily; ping so an unreachable server fails here.
        if let Err(e) = client
            .database(&config.database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            client.shutdown().await;
            return Err(StorageError::connection(e));
        }
        debug!(database = %config.database, "connected to mongodb");

        let collection = client
            .database(&config.database)
            .collection::<PipefileRecord>(&config.collection);

        let storage = Self {
            client,
            collection,
            database_name: config.database,
            collection_name: config.collection,
            closed: AtomicBool::new(false),
        };

        let indexed = storage.create_key_index().await;
        if let Err(e) = indexed {
            storage.client.shutdown().await;
            return Err(e);
        }

        Ok(storage)
    }

    async fn create_key_index(&self) -> StorageResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { KEY_FIELD: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        let result = self
            .collection
            .create_index(index)
            .await
            .map_err(|e| StorageError::index_creation(KEY_FIELD, e))?;

        debug!(
            collection = %self.collection_name,
            index = %result.index_name,
            "ensured unique key index"
        );
        Ok(())
    }

    /// Check if the server answers a ping
    pub async fn is_available(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
            && self
                .client
                .database(&self.database_name)
                .run_command(doc! { "ping": 1 })
                .await
                .is_ok()
    }

    /// Get the MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get the collection (for advanced operations)
    pub fn collection(&self) -> &Collection<PipefileRecord> {
        &self.collection
    }

    /// Name of the database in use
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Name of the collection in use
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl fmt::Debug for MongoStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStorage")
            .field("database_name", &self.database_name)
            .field("collection_name", &self.collection_name)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Classify an insert failure, singling out unique index violations
fn classify_write_error(key: &str, err: mongodb::error::Error) -> StorageError {
    let duplicate = matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    );

    if duplicate {
        StorageError::DuplicateKey {
            key: key.to_string(),
            source: err.into(),
        }
    } else {
        StorageError::unknown(err)
    }
}

#[async_trait]
impl Storage for MongoStorage {
    fn backend_type(&self) -> &'static str {
        "mongodb"
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.ensure_open()?;

        let record = self
            .collection
            .find_one(doc! { KEY_FIELD: key })
            .await
            .map_err(StorageError::unknown)?
            .ok_or_else(|| StorageError::not_found(key))?;

        Ok(record.file_data.bytes)
    }

    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;

        self.collection
            .insert_one(PipefileRecord::new(key, data))
            .await
            .map_err(|e| classify_write_error(key, e))?;

        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StorageError::Closed);
        }

        self.client.clone().shutdown().await;
        debug!(database = %self.database_name, "closed mongodb client");
        Ok(())
    }
}
