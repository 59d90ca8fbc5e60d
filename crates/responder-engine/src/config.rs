//! Layered service configuration
//!
//! Built-in defaults, then an optional TOML file, then environment
//! variables prefixed `RESPONDER__` with `__` between path segments
//! (for example `RESPONDER__CONSUMER__CONCURRENCY=4`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use responder_core::errors::{CoreError, CoreErrorKind};
use responder_core::logging_facility::Profile;
use responder_core::{MemoryStore, ResponderStore};
use responder_store::SqliteResponderStore;
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "RESPONDER";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::new(CoreErrorKind::Config)
            .with_op("load_config")
            .with_message(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub topics: TopicsConfig,
    pub destinations: DestinationsConfig,
    pub consumer: ConsumerConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Inbound topics
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub update_responder_command: String,
    pub responder_location_update: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            update_responder_command: "topic-responder-command".to_string(),
            responder_location_update: "topic-responder-location-update".to_string(),
        }
    }
}

/// Outbound destinations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DestinationsConfig {
    pub responder_updated_event: String,
    pub responders_created_event: String,
    pub responders_deleted_event: String,
}

impl Default for DestinationsConfig {
    fn default() -> Self {
        Self {
            responder_updated_event: "topic-responder-event".to_string(),
            responders_created_event: "topic-responder-created-event".to_string(),
            responders_deleted_event: "topic-responder-deleted-event".to_string(),
        }
    }
}

/// Listener container tuning
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Worker count; partitions are spread over workers by `partition % concurrency`
    pub concurrency: usize,
    /// Extra deliveries of an unacknowledged record before it is skipped
    pub max_redeliveries: u32,
    /// Records buffered per worker before submission blocks
    pub queue_depth: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_redeliveries: 3,
            queue_depth: 64,
        }
    }
}

/// Record store location; in-memory when no path is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Open the configured store
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error when the database cannot be opened or
    /// migrated.
    pub fn open(&self) -> Result<Arc<dyn ResponderStore>, CoreError> {
        match &self.path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "opening sqlite store");
                Ok(Arc::new(SqliteResponderStore::open(path)?))
            }
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl ServiceConfig {
    /// Load configuration from defaults, `path` and the process environment
    ///
    /// # Errors
    ///
    /// Returns `Load` when a source cannot be read or deserialized and
    /// `Invalid` when the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like `load`, reading environment variables from `env` instead of
    /// the process when given
    ///
    /// # Errors
    ///
    /// Same as `load`.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let loaded: ServiceConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check values for consistency
    ///
    /// # Errors
    ///
    /// Returns `Invalid` listing every violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.consumer.concurrency == 0 {
            errors.push("consumer.concurrency must be greater than 0".to_string());
        }
        if self.consumer.queue_depth == 0 {
            errors.push("consumer.queue_depth must be greater than 0".to_string());
        }
        let names = [
            ("topics.update_responder_command", &self.topics.update_responder_command),
            ("topics.responder_location_update", &self.topics.responder_location_update),
            ("destinations.responder_updated_event", &self.destinations.responder_updated_event),
            ("destinations.responders_created_event", &self.destinations.responders_created_event),
            ("destinations.responders_deleted_event", &self.destinations.responders_deleted_event),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                errors.push(format!("{} must not be empty", key));
            }
        }
        if self.topics.update_responder_command == self.topics.responder_location_update {
            errors.push("command and location topics must differ".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}
