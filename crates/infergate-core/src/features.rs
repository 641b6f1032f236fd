//! Feature payload schema and the request validator.
//!
//! The schema is strict on required fields and permissive on additions: every
//! named feature must be present and numeric, unknown keys are ignored.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FieldReason, InferError, Result, ValidationError};

/// Fixed-arity model input, one per `/predict` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl FeatureVector {
    /// Number of features the model consumes.
    pub const ARITY: usize = 4;

    /// Field names in model column order.
    pub const FIELDS: [&'static str; Self::ARITY] =
        ["sepal_length", "sepal_width", "petal_length", "petal_width"];

    pub fn as_array(&self) -> [f64; Self::ARITY] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }

    fn from_array(v: [f64; Self::ARITY]) -> Self {
        Self {
            sepal_length: v[0],
            sepal_width: v[1],
            petal_length: v[2],
            petal_width: v[3],
        }
    }
}

/// Parse and check a raw request body.
pub fn validate(raw: &[u8]) -> Result<FeatureVector> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| InferError::BadRequest(format!("body is not valid JSON: {e}")))?;
    validate_value(&value)
}

/// Check an already-parsed payload.
///
/// All offending fields are reported in one error, not just the first.
pub fn validate_value(value: &Value) -> Result<FeatureVector> {
    let obj = value
        .as_object()
        .ok_or_else(|| InferError::BadRequest("body must be a JSON object".into()))?;

    let mut out = [0.0; FeatureVector::ARITY];
    let mut err = ValidationError::default();

    for (slot, field) in out.iter_mut().zip(FeatureVector::FIELDS) {
        match read_field(obj, field) {
            Ok(v) => *slot = v,
            Err(reason) => err.push(field, reason),
        }
    }

    if !err.is_empty() {
        return Err(err.into());
    }
    Ok(FeatureVector::from_array(out))
}

fn read_field(obj: &Map<String, Value>, field: &str) -> std::result::Result<f64, FieldReason> {
    let v = match obj.get(field) {
        None => return Err(FieldReason::Missing),
        Some(v) => v,
    };
    let n = match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FieldReason::Invalid("number out of range".into()))?,
        // Lax coercion: "5.1" is accepted as 5.1.
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FieldReason::Invalid("input should be a valid number".into()))?,
        Value::Null => return Err(FieldReason::Invalid("must not be null".into())),
        _ => return Err(FieldReason::Invalid("input should be a valid number".into())),
    };
    if !n.is_finite() {
        return Err(FieldReason::Invalid("must be a finite number".into()));
    }
    Ok(n)
}

/// Integer class label returned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    prediction: i64,
}

impl Prediction {
    pub fn new(class: i64) -> Self {
        Self { prediction: class }
    }

    /// Cast raw model output to a class id, truncating toward zero.
    pub fn from_output(raw: f64) -> Result<Self> {
        if !raw.is_finite() {
            return Err(InferError::ModelInvocation(format!(
                "model produced non-finite output: {raw}"
            )));
        }
        let t = raw.trunc();
        // i64::MAX is not exactly representable; 2^63 is the first value out of range.
        if t < i64::MIN as f64 || t >= 9_223_372_036_854_775_808.0 {
            return Err(InferError::ModelInvocation(format!(
                "model output out of integer range: {raw}"
            )));
        }
        Ok(Self::new(t as i64))
    }

    pub fn class(&self) -> i64 {
        self.prediction
    }
}
