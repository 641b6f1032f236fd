//! Model handle: the one operation the serving path needs from a trained
//! classifier.
//!
//! The handle is loaded once before the listener binds and shared read-only
//! (`Arc<dyn Model>`) by every in-flight request.

pub mod tree;

use std::sync::Arc;

use serde::Serialize;
use infergate_core::{FeatureVector, Prediction, Result};

pub use tree::TreeEnsemble;

/// Synchronous, thread-safe classifier.
pub trait Model: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;

    /// Short description for startup logs.
    fn describe(&self) -> ModelInfo;
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub kind: &'static str,
    pub n_features: usize,
    pub n_estimators: usize,
}

/// Load the artifact at `path`. Any failure is a `Startup` error.
pub fn load(path: &str) -> Result<Arc<dyn Model>> {
    let model = TreeEnsemble::load(path)?;
    Ok(Arc::new(model))
}
