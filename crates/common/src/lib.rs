//! Clipline Common Utilities
//!
//! Shared infrastructure for all Clipline crates:
//! - Error taxonomy and the client-facing error body
//! - Stage stopwatch for timing diagnostics
//! - Tracing/logging initialization
//! - Service configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
