//! Shared application state for the inference server.
//!
//! Holds the three process-wide objects every handler needs: the validated
//! config, the loaded model handle, and the metrics registry. All are
//! immutable after construction (the registry mutates only through atomics
//! and its own lock), so cloning the state per request is an `Arc` bump.

use std::sync::Arc;

use infergate_core::error::Result;

use crate::config::ServerConfig;
use crate::model::{self, Model};
use crate::obs::InferenceMetrics;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServerConfig>,
    model: Arc<dyn Model>,
    metrics: Arc<InferenceMetrics>,
}

impl AppState {
    /// Build state from config, loading the model artifact it names.
    /// A missing or corrupt artifact is a `Startup` error.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let model = model::load(&cfg.model.path)?;
        Ok(Self::with_model(cfg, model))
    }

    /// Build state around an already-loaded model.
    pub fn with_model(cfg: ServerConfig, model: Arc<dyn Model>) -> Self {
        let metrics = Arc::new(InferenceMetrics::new(cfg.metrics.count_policy));
        Self {
            cfg: Arc::new(cfg),
            model,
            metrics,
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.cfg
    }

    pub fn model(&self) -> Arc<dyn Model> {
        Arc::clone(&self.model)
    }

    pub fn metrics(&self) -> Arc<InferenceMetrics> {
        Arc::clone(&self.metrics)
    }
}
