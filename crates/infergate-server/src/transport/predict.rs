//! `POST /predict`.
//!
//! Per request: Received -> Validating -> {Rejected | Predicting} -> Responded.
//! The body is taken as raw bytes so the core validator owns every rejection
//! message. The model runs on the blocking pool; a slow prediction only
//! delays its own request.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};

use infergate_core::error::InferError;
use infergate_core::{features, Prediction};

use crate::app_state::AppState;
use crate::obs::CountPolicy;
use crate::transport::error::ApiError;

pub async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let metrics = state.metrics();
    if metrics.policy() == CountPolicy::AllRequests {
        metrics.requests.inc();
    }

    let features = match body.map_err(body_error).and_then(|b| features::validate(&b)) {
        Ok(f) => f,
        Err(e) => {
            metrics.rejected.inc();
            tracing::debug!(error = %e, "predict request rejected");
            return Err(e.into());
        }
    };

    if metrics.policy() == CountPolicy::ReachedModel {
        metrics.requests.inc();
    }

    let model = state.model();
    let timer = metrics.start_timer();
    // The timer moves into the task so the sample lands even if the client
    // goes away before the model returns.
    let outcome = tokio::task::spawn_blocking(move || {
        let _timer = timer;
        model.predict(&features)
    })
    .await;

    let prediction = match outcome {
        Ok(res) => res?,
        Err(join) => {
            return Err(InferError::ModelInvocation(format!("model task aborted: {join}")).into())
        }
    };

    tracing::debug!(class = prediction.class(), "prediction served");
    Ok(Json(prediction))
}

fn body_error(rejection: BytesRejection) -> InferError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        InferError::PayloadTooLarge
    } else {
        InferError::BadRequest(rejection.body_text())
    }
}
