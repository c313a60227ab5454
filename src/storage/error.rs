//! Error types for storage operations

use thiserror::Error;

/// Boxed underlying cause attached to storage errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Coarse classification of a [`StorageError`].
///
/// Callers branch on the kind; the wrapped cause is for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    /// No entry is stored under the requested key
    NotFound,
    /// The backend could not be reached while opening
    ConnectionFailure,
    /// The key index could not be created while opening
    IndexFailure,
    /// An entry already exists under the key being written
    DuplicateKey,
    /// The backend has been closed
    Closed,
    /// Invalid backend configuration
    Configuration,
    /// Any other backend failure
    Unknown,
}

/// Error types for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key not found
    #[error("error entry not found: {key}")]
    EntryNotFound {
        /// Key that was looked up
        key: String,
    },

    /// Connecting to the backend failed
    #[error("error connecting to storage backend")]
    Connection(#[source] BoxError),

    /// Creating the index on the key field failed
    #[error("error creating index on field `{field}`")]
    IndexCreation {
        /// Indexed field
        field: String,
        /// Underlying backend error
        #[source]
        source: BoxError,
    },

    /// An entry already exists under this key
    #[error("error duplicate key: {key}")]
    DuplicateKey {
        /// Key that is already taken
        key: String,
        /// Underlying backend error
        #[source]
        source: BoxError,
    },

    /// The backend was used after `close`
    #[error("storage backend is closed")]
    Closed,

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Generic backend error
    #[error("error unknown storage error")]
    Unknown(#[source] BoxError),
}

impl StorageError {
    /// Create a not found error for `key`
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::EntryNotFound { key: key.into() }
    }

    /// Wrap an arbitrary backend failure
    pub fn unknown<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Unknown(err.into())
    }

    /// Wrap a connection failure
    pub fn connection<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Connection(err.into())
    }

    /// Wrap an index creation failure on `field`
    pub fn index_creation<S, E>(field: S, err: E) -> Self
    where
        S: Into<String>,
        E: Into<BoxError>,
    {
        Self::IndexCreation {
            field: field.into(),
            source: err.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            Self::EntryNotFound { .. } => StorageErrorKind::NotFound,
            Self::Connection(_) => StorageErrorKind::ConnectionFailure,
            Self::IndexCreation { .. } => StorageErrorKind::IndexFailure,
            Self::DuplicateKey { .. } => StorageErrorKind::DuplicateKey,
            Self::Closed => StorageErrorKind::Closed,
            Self::Configuration(_) => StorageErrorKind::Configuration,
            Self::Unknown(_) => StorageErrorKind::Unknown,
        }
    }

    /// Whether this is [`StorageErrorKind::NotFound`]
    pub fn is_not_found(&self) -> bool {
        self.kind() == StorageErrorKind::NotFound
    }
}
