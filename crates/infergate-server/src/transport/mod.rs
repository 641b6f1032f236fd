//! Request edge: the predict handler and the JSON error mapping.

pub mod error;
pub mod predict;

pub use error::ApiError;
