//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML config file (`--config`, or the platform config directory)
//! 3. Environment variables prefixed `ROWDUPE_`, `__` for nesting
//!    (e.g. `ROWDUPE_SCHEMA__TABLE=items`)
//! 4. CLI flags ([`Config::merge_store_args`], [`Config::merge_clean_args`])
//!
//! ```toml
//! database = "/var/lib/site/site.db"
//! kind = "acf-field"
//! strategy = "atomic"
//! busy_timeout_ms = 5000
//!
//! [schema]
//! table = "wp_posts"
//! id_column = "ID"
//! key_column = "post_name"
//! kind_column = "post_type"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{CleanArgs, StoreArgs};
use crate::resolver::{DeleteStrategy, ResolverConfig, DEFAULT_KIND};
use crate::store::{StoreError, TableSchema};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ROWDUPE_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A provider produced malformed or mistyped values.
    #[error("invalid configuration: {0}")]
    Invalid(Box<figment::Error>),

    /// A table or column name is unusable.
    #[error("invalid schema: {0}")]
    Schema(#[from] StoreError),

    /// The kind discriminator is empty.
    #[error("kind must not be empty")]
    EmptyKind,

    /// No database path was given anywhere.
    #[error("no database configured; pass --database, set ROWDUPE_DATABASE or add `database` to the config file")]
    MissingDatabase,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database holding the record table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Kind discriminator value.
    pub kind: String,
    /// Delete strategy for `clean`.
    pub strategy: DeleteStrategy,
    /// Busy timeout for a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Table layout.
    pub schema: TableSchema,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            kind: DEFAULT_KIND.to_string(),
            strategy: DeleteStrategy::default(),
            busy_timeout_ms: 5000,
            schema: TableSchema::default(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or from the default path if it
    /// exists, layered over defaults and under the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` is given but missing,
    /// or any extraction error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };
        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }
        Self::load_from(file.as_deref())
    }

    /// Load configuration with `path` as the file layer (skipped if `None`).
    ///
    /// The result is not validated: command-line flags may still replace
    /// any layer, so call [`validate`](Self::validate) after merging them.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider fails or a value has the wrong type.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    /// The layered figment, without extraction.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "rowdupe", "rowdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check the schema identifiers and the kind.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema.validate()?;
        if self.kind.trim().is_empty() {
            return Err(ConfigError::EmptyKind);
        }
        Ok(())
    }

    /// Apply store options given on the command line.
    pub fn merge_store_args(&mut self, args: &StoreArgs) {
        if let Some(ref database) = args.database {
            self.database = Some(database.clone());
        }
        if let Some(ref table) = args.table {
            self.schema.table = table.clone();
        }
        if let Some(ref column) = args.id_column {
            self.schema.id_column = column.clone();
        }
        if let Some(ref column) = args.key_column {
            self.schema.key_column = column.clone();
        }
        if let Some(ref column) = args.kind_column {
            self.schema.kind_column = column.clone();
        }
        if let Some(ref kind) = args.kind {
            self.kind = kind.clone();
        }
        if let Some(ms) = args.busy_timeout_ms {
            self.busy_timeout_ms = ms;
        }
    }

    /// Apply the options only the `clean` subcommand carries.
    ///
    /// Store options are merged separately through [`merge_store_args`](Self::merge_store_args).
    pub fn merge_clean_args(&mut self, args: &CleanArgs) {
        if let Some(strategy) = args.strategy {
            self.strategy = strategy;
        }
    }

    /// Database path, required by `count` and `clean`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabase`] if none was configured.
    pub fn database(&self) -> Result<&Path, ConfigError> {
        self.database.as_deref().ok_or(ConfigError::MissingDatabase)
    }

    /// Busy timeout as a duration.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Resolver settings derived from this configuration.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_kind(self.kind.clone())
            .with_strategy(self.strategy)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
