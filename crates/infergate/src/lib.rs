//! Top-level facade crate for infergate.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use infergate_core::*;
}

pub mod server {
    pub use infergate_server::*;
}
