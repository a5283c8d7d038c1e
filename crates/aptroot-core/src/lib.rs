//! Package provisioning pipeline for staging: sync the package index, fetch
//! every manifest requirement, extract the archives into an isolated
//! dependency root and publish the environment that locates them.

pub mod env;
pub mod fetch;
pub mod index;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod process;
pub mod stager;
pub mod supply;
pub mod types;

pub mod reporter;

pub use paths::CacheLayout;
pub use reporter::{NullReporter, Reporter};
pub use stager::Stager;
pub use supply::{FailureClass, Stage, Supplier, SupplyError, SupplyReport};

/// User Agent string for HTTP downloads
pub const USER_AGENT: &str = concat!("aptroot/", env!("CARGO_PKG_VERSION"));
