//! In-process metrics.
//!
//! Counters and the latency histogram live in an explicitly owned registry
//! (`InferenceMetrics`) and are rendered by the `/metrics` handler in
//! Prometheus text format.

pub mod metrics;

pub use metrics::{CountPolicy, InferenceMetrics};
