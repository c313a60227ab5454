//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::environment::EnvironmentLoader;
use crate::storage::{MemoryStorage, Storage, StorageError, StorageResult};

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config/pipefile.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// `[storage]` section
    #[serde(default)]
    pub storage: BackendConfig,
    /// `[mongodb]` section
    #[serde(default)]
    pub mongodb: MongoSettings,
}

/// Backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// "mongodb" (alias "documentdb") or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
}

fn default_backend() -> String {
    "mongodb".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

/// MongoDB connection settings
///
/// Unset fields keep the connection defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoSettings {
    /// Connection string
    pub uri: Option<String>,
    /// Database name
    pub database: Option<String>,
    /// Collection name
    pub collection: Option<String>,
    /// Server selection timeout in milliseconds
    pub server_selection_timeout_ms: Option<u64>,
    /// Application name reported to the server
    pub app_name: Option<String>,
    /// `false` connects without credentials, ignoring `[mongodb.credentials]`
    pub authentication: Option<bool>,
    /// `[mongodb.credentials]` section; an empty table means no credentials
    pub credentials: Option<CredentialSettings>,
}

/// Credential settings
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSettings {
    /// User name
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Database holding the user's credentials
    pub auth_source: Option<String>,
    /// Authentication mechanism, e.g. `SCRAM-SHA-256`
    pub mechanism: Option<String>,
}

impl CredentialSettings {
    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.auth_source.is_none()
            && self.mechanism.is_none()
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auth_source", &self.auth_source)
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

impl StorageSettings {
    /// Build a MongoDB configuration by applying these settings over the defaults.
    #[cfg(feature = "storage-mongodb")]
    pub fn mongo_config(&self) -> crate::storage::MongoStorageConfig {
        use crate::storage::{MongoStorageConfig, MongoStorageCredentials};

        let settings = &self.mongodb;
        let mut config = MongoStorageConfig::new();

        if let Some(uri) = &settings.uri {
            config = config.with_uri(uri);
        }
        if let Some(database) = &settings.database {
            config = config.with_database(database);
        }
        if let Some(collection) = &settings.collection {
            config = config.with_collection(collection);
        }
        if let Some(ms) = settings.server_selection_timeout_ms {
            config = config.with_server_selection_timeout(std::time::Duration::from_millis(ms));
        }
        if let Some(app_name) = &settings.app_name {
            config = config.with_app_name(app_name);
        }
        if settings.authentication == Some(false) {
            return config.without_authentication();
        }
        if let Some(creds) = &settings.credentials {
            if creds.is_empty() {
                return config.without_authentication();
            }
            // Missing fields fall back to the default credentials
            let defaults = MongoStorageCredentials::default();
            let mut credentials = MongoStorageCredentials::new(
                creds.username.clone().unwrap_or(defaults.username),
                creds.password.clone().unwrap_or(defaults.password),
            );
            credentials.auth_source = creds.auth_source.clone().or(defaults.auth_source);
            credentials.mechanism = creds.mechanism.clone();
            config = config.with_authentication(credentials);
        }

        config
    }

    /// Open the configured backend.
    pub async fn open(&self) -> StorageResult<Box<dyn Storage>> {
        match self.storage.backend.as_str() {
            "memory" => Ok(Box::new(MemoryStorage::new())),
            #[cfg(feature = "storage-mongodb")]
            "mongodb" | "documentdb" => {
                let storage = crate::storage::MongoStorage::open(self.mongo_config()).await?;
                Ok(Box::new(storage))
            }
            unknown => Err(StorageError::Configuration(format!(
                "Unknown backend type: {}",
                unknown
            ))),
        }
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct SettingsLoader {
    /// Path the settings were read from (or would have been)
    pub config_path: PathBuf,
    /// Loaded settings
    pub settings: StorageSettings,
}

impl SettingsLoader {
    /// Initialize settings loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses `config/pipefile.toml`.
    ///   A missing file yields the default settings.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let settings = if config_path.exists() {
            Self::load_settings(&config_path)?
        } else {
            StorageSettings::default()
        };

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Create a loader from already-parsed settings.
    pub fn from_settings(settings: StorageSettings) -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            settings,
        }
    }

    /// Load settings from TOML file.
    fn load_settings(path: &Path) -> Result<StorageSettings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Override file values with those set in the environment.
    pub fn apply_environment(mut self, env: &EnvironmentLoader) -> Self {
        let settings = &mut self.settings;

        if let Some(backend) = env.storage_backend() {
            settings.storage.backend = backend;
        }

        let mongodb = &mut settings.mongodb;
        if let Some(uri) = env.mongo_uri() {
            mongodb.uri = Some(uri);
        }
        if let Some(database) = env.mongo_database() {
            mongodb.database = Some(database);
        }
        if let Some(collection) = env.mongo_collection() {
            mongodb.collection = Some(collection);
        }
        if let Some(authentication) = env.mongo_authentication() {
            mongodb.authentication = Some(authentication);
        }

        let (username, password, auth_source) =
            (env.mongo_username(), env.mongo_password(), env.mongo_auth_source());
        if username.is_some() || password.is_some() || auth_source.is_some() {
            let creds = mongodb.credentials.get_or_insert_with(Default::default);
            if username.is_some() {
                creds.username = username;
            }
            if password.is_some() {
                creds.password = password;
            }
            if auth_source.is_some() {
                creds.auth_source = auth_source;
            }
        }

        self
    }
}
