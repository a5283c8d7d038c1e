//! aptroot - stage system packages for a build
//!
//! Installs Debian packages listed in an application's `Aptfile` into an
//! isolated dependency directory, without root and without touching the
//! host package database, then publishes the environment later phases
//! need to find the installed headers, libraries and binaries.
//!
//! # Directory Layout
//!
//! ```text
//! <cache>/apt/
//! ├── cache/archives/   # fetched .deb files
//! └── state/            # apt-get state
//! <deps>/<idx>/
//! ├── usr/ lib/ ...     # extracted payloads
//! ├── env/              # one file per variable
//! ├── profile.d/apt.sh  # launch-time exports
//! └── config.yml        # completion marker
//! ```

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]

pub mod cmd;
pub mod error;
pub mod stager;
pub mod ui;

pub use crate::error::ExitFailure;
pub use crate::stager::DirStager;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Process exit codes, one per failure class.
pub mod exit {
    use aptroot_core::FailureClass;

    /// Staging arguments do not describe usable directories.
    pub const INVALID_STAGING: u8 = 10;
    /// Directory or manifest setup failed.
    pub const SETUP: u8 = 13;
    /// Finalize could not publish the launch environment.
    pub const LAUNCH_ENV: u8 = 14;
    /// Index sync, fetch or extraction failed.
    pub const INSTALL: u8 = 16;
    /// Environment composition failed.
    pub const ENVIRONMENT: u8 = 17;
    /// The completion marker could not be written.
    pub const MARKER: u8 = 18;

    pub fn for_class(class: FailureClass) -> u8 {
        match class {
            FailureClass::Setup => SETUP,
            FailureClass::Install => INSTALL,
            FailureClass::Environment => ENVIRONMENT,
            FailureClass::Marker => MARKER,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "aptroot")]
#[command(author, version, about = "aptroot - stage system packages into an isolated dependency root")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Directories handed over by the staging system, in its argument order.
#[derive(Debug, Clone, Args)]
pub struct StagingArgs {
    /// Application build directory (holds the Aptfile)
    pub build_dir: PathBuf,
    /// Cache directory preserved between stagings
    pub cache_dir: PathBuf,
    /// Parent of all dependency directories
    pub deps_dir: PathBuf,
    /// Index of this supplier's dependency directory
    pub deps_idx: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch and extract the Aptfile packages, then write the environment
    Supply {
        #[command(flatten)]
        staging: StagingArgs,
        /// Package index tool
        #[arg(long, env = "APTROOT_APT_GET", default_value = "apt-get")]
        apt_get: String,
        /// Archive extraction tool
        #[arg(long, env = "APTROOT_DPKG", default_value = "dpkg")]
        dpkg: String,
    },
    /// Publish profile scripts into the application for launch
    Finalize {
        #[command(flatten)]
        staging: StagingArgs,
    },
}
