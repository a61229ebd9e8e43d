//! The ingestion run: discover the latest extract, normalize it, merge it
//! into the master dataset, publish the result.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shipstream_store::{ObjectStore, StoreError};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, PipelineConfig};
use crate::merge::{merge_increment, MergeError};
use crate::normalize::normalize_increment;
use crate::schema::{ColumnMap, CANONICAL_KEY};
use crate::snapshot::{latest_snapshot, SnapshotError};
use crate::table::{Table, TableError};

const INCREMENT_SUFFIX: &str = ".csv";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("increment discovery failed: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("failed to parse '{object}': {source}")]
    Parse {
        object: String,
        #[source]
        source: TableError,
    },
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("failed to serialize merged dataset: {0}")]
    Serialize(#[source] TableError),
    #[error("storage read failed for '{object}': {source}")]
    StorageRead {
        object: String,
        #[source]
        source: StoreError,
    },
    #[error("storage write failed for '{object}': {source}")]
    StorageWrite {
        object: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Structured outcome of a completed run, as reported to callers and over
/// the status API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub total_records_in_final_file: usize,
    /// (rows, columns) of the incoming increment as read, pre-normalization.
    pub new_records_shape: (usize, usize),
    /// (rows, columns) of the master dataset before this run.
    pub previous_records_shape: (usize, usize),
    /// Canonical key column the merge ran on.
    pub key_column_used: String,
    pub target_object: String,
}

/// One configured pipeline. Stateless between runs; the master dataset in
/// the store is the only carried state.
pub struct IngestPipeline {
    store: Arc<dyn ObjectStore>,
    config: PipelineConfig,
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IngestPipeline {
    /// Validates configuration up front so a misconfigured pipeline never
    /// reaches the store.
    pub fn new(store: Arc<dyn ObjectStore>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one run. Fails atomically: the single write to the master
    /// object happens last, so any earlier error leaves the store untouched.
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let config = &self.config;

        // 1. discover the latest increment extract
        let candidates = self
            .store
            .list(&config.source_namespace, INCREMENT_SUFFIX)
            .await
            .map_err(|source| PipelineError::StorageRead {
                object: format!("{}/", config.source_namespace),
                source,
            })?;
        let latest = latest_snapshot(&candidates)?;
        info!(file = %latest, "selected latest increment extract");

        // 2. read and parse it
        let increment_text = self.read(&config.source_namespace, &latest).await?;
        let raw_increment = Table::from_csv(&increment_text).map_err(|source| {
            PipelineError::Parse {
                object: latest.clone(),
                source,
            }
        })?;
        let new_records_shape = raw_increment.shape();

        // 3. normalize schema and values
        let columns = ColumnMap::for_key(&config.key_column);
        let increment = normalize_increment(raw_increment, &columns);

        // 4. read the previously published master dataset
        let master_text = self
            .read(&config.destination_namespace, &config.master_object)
            .await?;
        let master = Table::from_csv(&master_text).map_err(|source| PipelineError::Parse {
            object: config.master_object.clone(),
            source,
        })?;
        let previous_records_shape = master.shape();
        info!(
            rows = previous_records_shape.0,
            "read previously published master dataset"
        );

        // 5. merge
        let merged = merge_increment(master, increment, CANONICAL_KEY, config.merge_policy)?;
        let total_records = merged.height();

        // 6. publish (the run's only write)
        let body = merged.to_csv().map_err(PipelineError::Serialize)?;
        self.store
            .write(
                &config.destination_namespace,
                &config.master_object,
                Bytes::from(body),
                "text/csv",
            )
            .await
            .map_err(|source| PipelineError::StorageWrite {
                object: config.master_object.clone(),
                source,
            })?;
        info!(
            rows = total_records,
            object = %config.master_object,
            "published merged master dataset"
        );

        Ok(RunOutcome {
            status: RunStatus::Success,
            total_records_in_final_file: total_records,
            new_records_shape,
            previous_records_shape,
            key_column_used: CANONICAL_KEY.to_string(),
            target_object: config.master_object.clone(),
        })
    }

    async fn read(&self, namespace: &str, name: &str) -> Result<String, PipelineError> {
        self.store
            .read_text(namespace, name)
            .await
            .map_err(|source| PipelineError::StorageRead {
                object: name.to_string(),
                source,
            })
    }
}
