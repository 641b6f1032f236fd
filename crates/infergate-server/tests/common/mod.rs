//! Shared fixtures for server integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use infergate_core::error::{InferError, Result};
use infergate_core::{FeatureVector, Prediction};
use infergate_server::app_state::AppState;
use infergate_server::config::ServerConfig;
use infergate_server::model::{Model, ModelInfo, TreeEnsemble};
use infergate_server::obs::CountPolicy;
use infergate_server::router::build_router;

pub const SETOSA: &str =
    r#"{"sepal_length":5.1,"sepal_width":3.5,"petal_length":1.4,"petal_width":0.2}"#;

pub const SHIPPED_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../models/iris_tree.json");

/// What the stub model does on every call.
pub enum Behavior {
    Class(i64),
    Fail,
    Panic,
}

pub struct StubModel(pub Behavior);

impl Model for StubModel {
    fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
        match self.0 {
            Behavior::Class(c) => Ok(Prediction::new(c)),
            Behavior::Fail => Err(InferError::ModelInvocation("input shape mismatch".into())),
            Behavior::Panic => panic!("stub model panicked"),
        }
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo { kind: "stub", n_features: FeatureVector::ARITY, n_estimators: 1 }
    }
}

pub fn state_with(model: Arc<dyn Model>, policy: CountPolicy) -> AppState {
    let mut cfg = ServerConfig::default();
    cfg.metrics.count_policy = policy;
    AppState::with_model(cfg, model)
}

pub fn stub_state(b: Behavior) -> AppState {
    state_with(Arc::new(StubModel(b)), CountPolicy::ReachedModel)
}

pub fn iris_state() -> AppState {
    let model = TreeEnsemble::load(SHIPPED_MODEL).expect("shipped model loads");
    state_with(Arc::new(model), CountPolicy::ReachedModel)
}

pub fn app(state: &AppState) -> Router {
    build_router(state.clone())
}

pub fn post_predict(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Response<Body>) {
    let resp = app.oneshot(req).await.unwrap();
    (resp.status(), resp)
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of an unlabelled sample line in exposition text.
pub fn sample(text: &str, name: &str) -> Option<String> {
    let prefix = format!("{name} ");
    text.lines()
        .find_map(|l| l.strip_prefix(prefix.as_str()).map(str::to_string))
}
