//! infergate server library entry.
//!
//! Wires config, the model handle, the metrics registry, and the HTTP
//! handlers into an axum router. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod model;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
