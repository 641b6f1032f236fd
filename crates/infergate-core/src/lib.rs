//! infergate core: request schema, prediction type, and the error taxonomy.
//!
//! This crate defines the contracts shared by the server, the model adapters,
//! and any client tooling. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed payloads surface as `InferError`/`Result`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod features;

/// Shared result type.
pub use error::{Result, InferError};
pub use features::{FeatureVector, Prediction};
