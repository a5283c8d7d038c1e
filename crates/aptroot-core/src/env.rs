//! Environment composition for the dependency root.
//!
//! | Variable | Fragments (relative to the root), then the inherited value |
//! |---|---|
//! | `PATH` | `usr/bin` |
//! | `LD_LIBRARY_PATH` | `lib/x86_64-linux-gnu`, `usr/lib/x86_64-linux-gnu`, `usr/lib/i386-linux-gnu`, `usr/lib` |
//! | `LIBRARY_PATH` | same as `LD_LIBRARY_PATH` |
//! | `INCLUDE_PATH` | `usr/include` |
//! | `CPATH` | value of `INCLUDE_PATH` |
//! | `CPPPATH` | value of `INCLUDE_PATH` |
//! | `PKG_CONFIG_PATH` | `usr/lib/x86_64-linux-gnu/pkgconfig`, `usr/lib/i386-linux-gnu/pkgconfig`, `usr/lib/pkgconfig` |
//!
//! Fragment order is significant: architecture-qualified directories come
//! before generic ones and the inherited value is always last.

use thiserror::Error;

use crate::stager::Stager;
use crate::types::EnvBinding;

/// Name of the profile script written under `profile.d`.
pub const PROFILE_SCRIPT: &str = "apt.sh";

const LIBRARY_DIRS: &[&str] = &[
    "lib/x86_64-linux-gnu",
    "usr/lib/x86_64-linux-gnu",
    "usr/lib/i386-linux-gnu",
    "usr/lib",
];

const PKG_CONFIG_DIRS: &[&str] = &[
    "usr/lib/x86_64-linux-gnu/pkgconfig",
    "usr/lib/i386-linux-gnu/pkgconfig",
    "usr/lib/pkgconfig",
];

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Could not write env file {name}: {source}")]
    EnvFile {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write profile script {script}: {source}")]
    ProfileScript {
        script: String,
        #[source]
        source: std::io::Error,
    },
}

/// The dependency root as seen by later phases: `$DEPS_DIR/<idx>`.
///
/// Kept symbolic so the bindings stay valid when the deps directory is
/// mounted elsewhere at launch.
pub fn launch_root(deps_idx: &str) -> String {
    format!("$DEPS_DIR/{deps_idx}")
}

/// `<root>/<fragment>:...:$<name>`
fn search_path(root: &str, fragments: &[&str], inherit: &str) -> String {
    fragments
        .iter()
        .map(|fragment| format!("{root}/{fragment}"))
        .chain(std::iter::once(format!("${inherit}")))
        .collect::<Vec<_>>()
        .join(":")
}

/// Derive every binding for the given dependency root.
pub fn compose(root: &str) -> Vec<EnvBinding> {
    let root = root.trim_end_matches('/');
    let include_path = search_path(root, &["usr/include"], "INCLUDE_PATH");

    vec![
        EnvBinding::new("PATH", search_path(root, &["usr/bin"], "PATH")),
        EnvBinding::new(
            "LD_LIBRARY_PATH",
            search_path(root, LIBRARY_DIRS, "LD_LIBRARY_PATH"),
        ),
        EnvBinding::new("LIBRARY_PATH", search_path(root, LIBRARY_DIRS, "LIBRARY_PATH")),
        EnvBinding::new("INCLUDE_PATH", include_path.clone()),
        EnvBinding::new("CPATH", include_path.clone()),
        EnvBinding::new("CPPPATH", include_path),
        EnvBinding::new(
            "PKG_CONFIG_PATH",
            search_path(root, PKG_CONFIG_DIRS, "PKG_CONFIG_PATH"),
        ),
    ]
}

/// One `export NAME="VALUE"` line per binding, each newline-terminated.
pub fn profile_script(bindings: &[EnvBinding]) -> String {
    bindings
        .iter()
        .map(|b| b.export_line() + "\n")
        .collect()
}

/// Hand every binding to both sinks: one env file per variable, then the
/// profile script.
///
/// # Errors
///
/// Returns the first sink failure. Env files written before the failure are
/// left in place.
pub fn write_bindings<S: Stager + ?Sized>(
    stager: &S,
    bindings: &[EnvBinding],
) -> Result<(), EnvError> {
    for binding in bindings {
        stager
            .write_env_file(&binding.name, &binding.value)
            .map_err(|source| EnvError::EnvFile {
                name: binding.name.clone(),
                source,
            })?;
    }

    stager
        .write_profile_d(PROFILE_SCRIPT, &profile_script(bindings))
        .map_err(|source| EnvError::ProfileScript {
            script: PROFILE_SCRIPT.to_string(),
            source,
        })
}
