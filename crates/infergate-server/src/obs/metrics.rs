//! Metrics registry for the inference server.
//!
//! Counters are plain atomics. A histogram keeps its bucket counts, sample
//! count and sum behind a single mutex so a render never sees an observation
//! half-applied. Bucket bounds are fixed, in seconds.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;

/// Upper bounds of the latency buckets, seconds. `+Inf` is implicit.
pub const LATENCY_BUCKETS_SECONDS: [f64; 10] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Which `/predict` calls bump `inference_requests_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// Only calls that pass validation and reach the model.
    #[default]
    ReachedModel,
    /// Every call, counted before validation.
    AllRequests,
}

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter {
    v: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.v.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.v.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} counter");
        let _ = writeln!(out, "{name} {}", self.get());
    }
}

/// Point-in-time copy of a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Cumulative counts, one per entry of `LATENCY_BUCKETS_SECONDS`.
    pub buckets: [u64; 10],
    pub count: u64,
    pub sum: f64,
}

#[derive(Debug, Default)]
struct HistogramState {
    buckets: [u64; 10],
    count: u64,
    sum: f64,
}

/// Cumulative histogram over `LATENCY_BUCKETS_SECONDS`.
#[derive(Debug, Default)]
pub struct Histogram {
    state: Mutex<HistogramState>,
}

impl Histogram {
    pub fn observe(&self, d: Duration) {
        self.observe_secs(d.as_secs_f64());
    }

    /// Record one sample. Negative or non-finite samples count as zero.
    pub fn observe_secs(&self, secs: f64) {
        let secs = if secs.is_finite() && secs > 0.0 { secs } else { 0.0 };

        // A poisoned lock still holds consistent data: every update below is
        // infallible once the guard is taken.
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.count += 1;
        st.sum += secs;
        // Cumulative buckets: bump every bound at or above the sample.
        for (i, &le) in LATENCY_BUCKETS_SECONDS.iter().enumerate() {
            if secs <= le {
                st.buckets[i] += 1;
            }
        }
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        HistogramSnapshot {
            buckets: st.buckets,
            count: st.count,
            sum: st.sum,
        }
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        let snap = self.snapshot();
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} histogram");
        for (le, count) in LATENCY_BUCKETS_SECONDS.iter().zip(snap.buckets) {
            let _ = writeln!(out, "{name}_bucket{{le=\"{}\"}} {count}", fmt_float(*le));
        }
        let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {}", snap.count);
        let _ = writeln!(out, "{name}_count {}", snap.count);
        let _ = writeln!(out, "{name}_sum {}", fmt_float(snap.sum));
    }
}

/// Float formatting used by Prometheus clients: always carries a decimal point.
fn fmt_float(v: f64) -> String {
    format!("{v:?}")
}

/// All server metrics. One instance per process, shared through `AppState`.
#[derive(Debug, Default)]
pub struct InferenceMetrics {
    pub requests: Counter,
    pub rejected: Counter,
    pub latency: Histogram,
    policy: CountPolicy,
}

impl InferenceMetrics {
    pub fn new(policy: CountPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> CountPolicy {
        self.policy
    }

    /// Start timing one model invocation. The sample is recorded when the
    /// returned guard drops, including on error or unwind.
    pub fn start_timer(self: &Arc<Self>) -> LatencyTimer {
        LatencyTimer {
            metrics: Arc::clone(self),
            started: Instant::now(),
        }
    }

    /// Render every metric in Prometheus text exposition format (0.0.4).
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render(
            "inference_requests_total",
            "Total inference requests.",
            &mut out,
        );
        self.latency.render(
            "inference_request_latency_seconds",
            "Model invocation latency (seconds).",
            &mut out,
        );
        self.rejected.render(
            "inference_rejected_requests_total",
            "Predict requests rejected by validation.",
            &mut out,
        );
        out
    }
}

/// Drop guard returned by `InferenceMetrics::start_timer`.
pub struct LatencyTimer {
    metrics: Arc<InferenceMetrics>,
    started: Instant,
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        self.metrics.latency.observe(self.started.elapsed());
    }
}
