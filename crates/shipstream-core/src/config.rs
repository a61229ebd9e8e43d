//! Run configuration, resolved from the environment before any I/O.

use thiserror::Error;

use crate::merge::MergePolicy;
use crate::schema;

pub const ENV_SOURCE_NAMESPACE: &str = "SHIPSTREAM_SOURCE_NAMESPACE";
pub const ENV_DESTINATION_NAMESPACE: &str = "SHIPSTREAM_DEST_NAMESPACE";
pub const ENV_KEY_COLUMN: &str = "SHIPSTREAM_KEY_COLUMN";
pub const ENV_MASTER_OBJECT: &str = "SHIPSTREAM_MASTER_OBJECT";
pub const ENV_MERGE_POLICY: &str = "SHIPSTREAM_MERGE_POLICY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything one pipeline run needs besides the store connection itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Namespace the timestamped increment extracts are dropped into.
    pub source_namespace: String,
    /// Namespace the merged master dataset is published to.
    pub destination_namespace: String,
    /// Raw header name of the key field in incoming extracts.
    pub key_column: String,
    /// Object name of the published master dataset.
    pub master_object: String,
    pub merge_policy: MergePolicy,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            source_namespace: required(ENV_SOURCE_NAMESPACE)?,
            destination_namespace: required(ENV_DESTINATION_NAMESPACE)?,
            key_column: required(ENV_KEY_COLUMN)?,
            master_object: required(ENV_MASTER_OBJECT)?,
            merge_policy: merge_policy_from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject blank required parameters. Runs before the pipeline performs
    /// any storage call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            (ENV_SOURCE_NAMESPACE, &self.source_namespace),
            (ENV_DESTINATION_NAMESPACE, &self.destination_namespace),
            (ENV_KEY_COLUMN, &self.key_column),
            (ENV_MASTER_OBJECT, &self.master_object),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_namespace: "inbound".to_string(),
            destination_namespace: "published".to_string(),
            key_column: schema::DEFAULT_KEY_HEADER.to_string(),
            master_object: "tracking_master.csv".to_string(),
            merge_policy: MergePolicy::default(),
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn merge_policy_from_env() -> Result<MergePolicy, ConfigError> {
    match std::env::var(ENV_MERGE_POLICY) {
        Ok(value) => value.parse().map_err(|reason| ConfigError::Invalid {
            name: ENV_MERGE_POLICY,
            reason,
        }),
        Err(_) => Ok(MergePolicy::default()),
    }
}
