//! Shared service state and the single-run coordinator.
//!
//! The coordinator owns one slot describing the pipeline's lifecycle. A run
//! may start only from a non-running slot, so concurrent trigger requests
//! can never interleave two read-merge-write sequences against the same
//! master object.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shipstream_core::pipeline::{IngestPipeline, RunOutcome};
use shipstream_store::ObjectStore;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running {
        started_at: DateTime<Utc>,
    },
    Completed {
        finished_at: DateTime<Utc>,
        outcome: RunOutcome,
    },
    Failed {
        finished_at: DateTime<Utc>,
        error: String,
    },
}

pub struct RunCoordinator {
    slot: Mutex<RunState>,
}

impl Default for RunCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RunCoordinator {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(RunState::Idle),
        }
    }

    /// Claim the slot for a new run. Returns the current state unchanged if
    /// a run is already in flight.
    pub async fn begin(&self) -> Result<(), RunState> {
        let mut slot = self.slot.lock().await;
        if matches!(*slot, RunState::Running { .. }) {
            return Err(slot.clone());
        }
        *slot = RunState::Running {
            started_at: Utc::now(),
        };
        Ok(())
    }

    pub async fn complete(&self, outcome: RunOutcome) {
        let mut slot = self.slot.lock().await;
        *slot = RunState::Completed {
            finished_at: Utc::now(),
            outcome,
        };
    }

    /// Record a failure. Always called on the error path so a thrown run
    /// can never leave the slot stuck in `Running`.
    pub async fn fail(&self, error: String) {
        let mut slot = self.slot.lock().await;
        *slot = RunState::Failed {
            finished_at: Utc::now(),
            error,
        };
    }

    pub async fn current(&self) -> RunState {
        self.slot.lock().await.clone()
    }
}

pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub coordinator: RunCoordinator,
    pub store: Arc<dyn ObjectStore>,
    /// Namespace relayed CSVs are written into; the pipeline's source.
    pub relay_namespace: String,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        pipeline: Arc<IngestPipeline>,
        store: Arc<dyn ObjectStore>,
        relay_namespace: String,
    ) -> Self {
        Self {
            pipeline,
            coordinator: RunCoordinator::new(),
            store,
            relay_namespace,
            http: reqwest::Client::new(),
        }
    }
}
