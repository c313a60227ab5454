//! Configuration management for pipefile storage.
//!
//! This module provides settings loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use pipefile_storage::config::{EnvironmentLoader, SettingsLoader};
//! use std::path::Path;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let env = EnvironmentLoader::new(Some(Path::new(".env")));
//!     let loader = SettingsLoader::new(Some(Path::new("config/pipefile.toml")))?
//!         .apply_environment(&env);
//!
//!     let storage = loader.settings.open().await?;
//!     storage.put("a", b"payload").await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    BackendConfig, CredentialSettings, MongoSettings, SettingsLoader, StorageSettings,
    DEFAULT_CONFIG_PATH,
};
pub use self::environment::EnvironmentLoader;
