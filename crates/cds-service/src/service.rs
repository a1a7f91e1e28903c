//! Async scenario-generation service.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;

use cds_pipeline::{CancelToken, Pipeline, PipelineError, PipelineRequest, ScenarioInventory};
use cds_types::RunId;

use crate::request::{ScenarioRequest, ScenarioResponse};

/// Default wall-clock budget per request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned by the service boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The referenced prior run does not exist in the store.
    #[error("run '{0}' not found")]
    UnknownRun(RunId),

    /// The request exceeded its wall-clock budget and was cancelled.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The pipeline rejected or failed the request.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The worker task panicked.
    #[error("pipeline worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Append-only store of completed run inventories.
///
/// A stored inventory is immutable; incremental runs read it and produce a
/// new inventory under a new run id.
#[derive(Debug, Default)]
pub struct RunStore {
    runs: RwLock<HashMap<RunId, Arc<ScenarioInventory>>>,
}

impl RunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a completed run's inventory.
    pub async fn get(&self, run_id: &str) -> Option<Arc<ScenarioInventory>> {
        self.runs.read().await.get(run_id).cloned()
    }

    /// Stores a completed run's inventory.
    pub async fn insert(&self, inventory: Arc<ScenarioInventory>) {
        self.runs
            .write()
            .await
            .insert(inventory.run_id.clone(), inventory);
    }

    /// Number of stored runs.
    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Returns true if no runs are stored.
    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }
}

/// Runs scenario-generation requests on blocking workers with a per-request
/// timeout.
#[derive(Clone)]
pub struct ScenarioService {
    pipeline: Arc<Pipeline>,
    store: Arc<RunStore>,
    timeout: Duration,
}

impl ScenarioService {
    /// Creates a service over a pipeline with the default timeout.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            store: Arc::new(RunStore::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The run store holding completed inventories.
    pub fn store(&self) -> Arc<RunStore> {
        Arc::clone(&self.store)
    }

    /// Submits one request and waits for its inventory.
    ///
    /// The pipeline runs on a blocking worker; if the timeout elapses first,
    /// the run is cancelled cooperatively and no partial inventory is stored.
    pub async fn submit(
        &self,
        run_id: impl Into<RunId>,
        request: ScenarioRequest,
    ) -> Result<ScenarioResponse, ServiceError> {
        let run_id = run_id.into();

        let prior_inventory = match &request.prior_inventory_run {
            Some(prior_run) => {
                let inventory = self
                    .store
                    .get(prior_run)
                    .await
                    .ok_or_else(|| ServiceError::UnknownRun(prior_run.clone()))?;
                Some((*inventory).clone())
            }
            None => None,
        };

        tracing::info!(
            run_id = %run_id,
            sections = request.sections.len(),
            modes = request.enabled_modes.len(),
            incremental = prior_inventory.is_some(),
            "starting scenario generation run"
        );

        let pipeline_request = PipelineRequest {
            sections: request.sections,
            enabled_modes: request.enabled_modes,
            coverage_overrides: request.coverage_overrides,
            prior_inventory,
        };

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let worker_run_id = run_id.clone();
        let worker = tokio::task::spawn_blocking(move || {
            pipeline.run(worker_run_id, &pipeline_request, &worker_cancel)
        });

        let inventory = match tokio::time::timeout(self.timeout, worker).await {
            Ok(joined) => joined??,
            Err(_) => {
                cancel.cancel();
                tracing::warn!(run_id = %run_id, timeout = ?self.timeout, "run timed out, cancelling");
                return Err(ServiceError::Timeout(self.timeout));
            }
        };

        tracing::info!(
            run_id = %run_id,
            scenarios = inventory.len(),
            duplicates_removed = inventory.report.duplicates_removed,
            unparsed_sentences = inventory.report.unparsed_sentences,
            "run complete"
        );

        let inventory = Arc::new(inventory);
        self.store.insert(Arc::clone(&inventory)).await;
        Ok(ScenarioResponse::from(inventory.as_ref()))
    }
}
