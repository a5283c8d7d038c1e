//! Shared types for aptroot.
//!
//! Plain data only: no I/O lives here, so both the pipeline and the CLI can
//! depend on it without pulling in a runtime.

/// Manifest and package data types.
pub mod types;

// Re-exports
pub use types::*;
