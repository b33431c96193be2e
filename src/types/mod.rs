//! Transport Types
//!
//! Configuration shared read-only by every request.

pub mod config;

pub use config::*;
