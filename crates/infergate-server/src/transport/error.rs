//! HTTP mapping for `InferError`.
//!
//! Every failure leaves the server as one JSON object:
//! `{"error": <code>, "message": <text>}`, plus `fields` for validation
//! failures. Server-side failures are logged here and the client only sees a
//! generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use infergate_core::error::InferError;

/// Newtype so the core error can implement `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub InferError);

impl From<InferError> for ApiError {
    fn from(e: InferError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            InferError::BadRequest(_) => StatusCode::BAD_REQUEST,
            InferError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InferError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            InferError::ModelInvocation(_)
            | InferError::Startup(_)
            | InferError::Config(_)
            | InferError::UnsupportedVersion
            | InferError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.client_code().as_str();

        let body = match &self.0 {
            InferError::Validation(v) => {
                let fields: Vec<_> = v
                    .issues()
                    .iter()
                    .map(|i| json!({ "field": i.field, "reason": i.reason.to_string() }))
                    .collect();
                json!({ "error": code, "message": v.to_string(), "fields": fields })
            }
            InferError::BadRequest(_) | InferError::PayloadTooLarge => {
                json!({ "error": code, "message": self.0.to_string() })
            }
            other => {
                tracing::error!(error = %other, code, "request failed");
                let message = match other {
                    InferError::ModelInvocation(_) => "prediction failed",
                    _ => "internal server error",
                };
                json!({ "error": code, "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
