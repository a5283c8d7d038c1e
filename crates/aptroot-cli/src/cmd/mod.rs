//! Staging phase entry points.

pub mod finalize;
pub mod supply;
