//! Shared error type across infergate crates.

use std::fmt;

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Body is not a JSON object.
    BadRequest,
    /// Required feature missing or not numeric.
    ValidationFailed,
    /// Body exceeds the configured limit.
    PayloadTooLarge,
    /// The model failed while predicting.
    ModelInvocation,
    /// Model could not be loaded at boot.
    Startup,
    /// Config file unreadable or invalid.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::ValidationFailed => "VALIDATION_FAILED",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::ModelInvocation => "MODEL_INVOCATION",
            ClientCode::Startup => "STARTUP",
            ClientCode::Config => "CONFIG",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, InferError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum InferError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(ValidationError),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),
    #[error("startup failed: {0}")]
    Startup(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl InferError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            InferError::BadRequest(_) => ClientCode::BadRequest,
            InferError::Validation(_) => ClientCode::ValidationFailed,
            InferError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            InferError::ModelInvocation(_) => ClientCode::ModelInvocation,
            InferError::Startup(_) => ClientCode::Startup,
            InferError::Config(_) => ClientCode::Config,
            InferError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            InferError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<ValidationError> for InferError {
    fn from(e: ValidationError) -> Self {
        InferError::Validation(e)
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReason {
    Missing,
    Invalid(String),
}

impl fmt::Display for FieldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldReason::Missing => f.write_str("field required"),
            FieldReason::Invalid(why) => f.write_str(why),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub reason: FieldReason,
}

/// Field-level rejection of a feature payload.
///
/// Issues are kept in schema order, so the message is stable for a given body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn push(&mut self, field: &'static str, reason: FieldReason) {
        self.issues.push(FieldIssue { field, reason });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of fields absent from the payload.
    pub fn missing(&self) -> Vec<&'static str> {
        self.issues
            .iter()
            .filter(|i| i.reason == FieldReason::Missing)
            .map(|i| i.field)
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = self.missing();
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing required field(s): {}", missing.join(", ")));
        }
        for issue in &self.issues {
            if let FieldReason::Invalid(why) = &issue.reason {
                parts.push(format!("{}: {}", issue.field, why));
            }
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}
