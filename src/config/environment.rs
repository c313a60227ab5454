//! Environment variable loading and management.
//!
//! Environment values take precedence over the TOML settings file; see
//! [`SettingsLoader::apply_environment`](super::SettingsLoader::apply_environment).

use std::env;
use std::path::Path;

/// Backend selection ("mongodb" or "memory")
pub const ENV_STORAGE_BACKEND: &str = "PIPEFILE_STORAGE_BACKEND";
/// MongoDB connection string
pub const ENV_MONGO_URI: &str = "PIPEFILE_MONGO_URI";
/// MongoDB database name
pub const ENV_MONGO_DATABASE: &str = "PIPEFILE_MONGO_DATABASE";
/// MongoDB collection name
pub const ENV_MONGO_COLLECTION: &str = "PIPEFILE_MONGO_COLLECTION";
/// MongoDB user name
pub const ENV_MONGO_USERNAME: &str = "PIPEFILE_MONGO_USERNAME";
/// MongoDB password
pub const ENV_MONGO_PASSWORD: &str = "PIPEFILE_MONGO_PASSWORD";
/// MongoDB authentication source
pub const ENV_MONGO_AUTH_SOURCE: &str = "PIPEFILE_MONGO_AUTH_SOURCE";
/// MongoDB authentication switch: `none`/`false`/`off`/`0` or `true`/`on`/`1`
pub const ENV_MONGO_AUTH: &str = "PIPEFILE_MONGO_AUTH";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Only an explicitly provided file is loaded.
    pub fn new(env_file: Option<&Path>) -> Self {
        // Only an explicitly given file is loaded
        if let Some(path) = env_file.filter(|p| p.exists()) {
            if let Err(e) = dotenv::from_path(path) {
                eprintln!("Warning: Failed to load .env file: {}", e);
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Path of the loaded .env file, if one was given
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Storage backend selection.
    pub fn storage_backend(&self) -> Option<String> {
        Self::non_empty(ENV_STORAGE_BACKEND)
    }

    /// MongoDB connection string.
    pub fn mongo_uri(&self) -> Option<String> {
        Self::non_empty(ENV_MONGO_URI)
    }

    /// MongoDB database name.
    pub fn mongo_database(&self) -> Option<String> {
        Self::non_empty(ENV_MONGO_DATABASE)
    }

    /// MongoDB collection name.
    pub fn mongo_collection(&self) -> Option<String> {
        Self::non_empty(ENV_MONGO_COLLECTION)
    }

    /// MongoDB user name.
    pub fn mongo_username(&self) -> Option<String> {
        Self::non_empty(ENV_MONGO_USERNAME)
    }

    /// MongoDB password.
    pub fn mongo_password(&self) -> Option<String> {
        Self::non_empty(ENV_MONGO_PASSWORD)
    }

    /// MongoDB authentication source.
    pub fn mongo_auth_source(&self) -> Option<String> {
        Self::non_empty(ENV_MONGO_AUTH_SOURCE)
    }

    /// Whether to authenticate; `None` when unset or unrecognised.
    pub fn mongo_authentication(&self) -> Option<bool> {
        match Self::non_empty(ENV_MONGO_AUTH)?.trim().to_ascii_lowercase().as_str() {
            "none" | "false" | "off" | "0" => Some(false),
            "true" | "on" | "1" => Some(true),
            _ => None,
        }
    }

    fn non_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
