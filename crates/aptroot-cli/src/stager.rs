//! Filesystem-backed staging collaborator.
//!
//! Lays files out the way later staging phases and the launcher expect:
//! `<deps>/<idx>/env/<NAME>`, `<deps>/<idx>/profile.d/<script>` and
//! `<deps>/<idx>/config.yml`; at finalize, profile scripts are published to
//! `<build>/.profile.d/<idx>_<script>`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use aptroot_core::Stager;
use aptroot_schema::BuildpackConfig;

use crate::StagingArgs;

#[derive(Debug, Clone)]
pub struct DirStager {
    build_dir: PathBuf,
    cache_dir: PathBuf,
    deps_dir: PathBuf,
    deps_idx: String,
}

impl DirStager {
    /// Relative staging paths are resolved against the current directory.
    pub fn new(args: &StagingArgs) -> Result<Self> {
        Ok(Self {
            build_dir: absolute(&args.build_dir)?,
            cache_dir: absolute(&args.cache_dir)?,
            deps_dir: absolute(&args.deps_dir)?,
            deps_idx: args.deps_idx.clone(),
        })
    }

    /// [`DirStager::new`] followed by [`DirStager::check_valid`].
    pub fn open(args: &StagingArgs) -> Result<Self> {
        let stager = Self::new(args)?;
        stager.check_valid()?;
        Ok(stager)
    }

    /// The build directory must exist and the index must be a plain name.
    pub fn check_valid(&self) -> Result<()> {
        if !self.build_dir.is_dir() {
            bail!("Build directory {} does not exist", self.build_dir.display());
        }
        let idx = self.deps_idx.as_str();
        if idx.is_empty() || idx == "." || idx == ".." || idx.contains('/') {
            bail!("Invalid dependency index {idx:?}");
        }
        Ok(())
    }

    /// Copy this root's profile scripts into `<build>/.profile.d`, prefixed
    /// with the dependency index. Returns how many were published.
    pub fn set_launch_environment(&self) -> Result<usize> {
        let src = self.dep_dir().join("profile.d");
        if !src.is_dir() {
            return Ok(0);
        }

        let dest = self.build_dir.join(".profile.d");
        std::fs::create_dir_all(&dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut scripts = Vec::new();
        for entry in std::fs::read_dir(&src)
            .with_context(|| format!("Failed to read {}", src.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                scripts.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        scripts.sort();

        for script in &scripts {
            let target = dest.join(format!("{}_{script}", self.deps_idx));
            std::fs::copy(src.join(script), &target)
                .with_context(|| format!("Failed to publish {}", target.display()))?;
        }
        Ok(scripts.len())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid staging path {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

impl Stager for DirStager {
    fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn dep_dir(&self) -> PathBuf {
        self.deps_dir.join(&self.deps_idx)
    }

    fn deps_idx(&self) -> &str {
        &self.deps_idx
    }

    fn write_env_file(&self, name: &str, value: &str) -> std::io::Result<()> {
        write_file(&self.dep_dir().join("env").join(name), value)
    }

    fn write_profile_d(&self, script: &str, content: &str) -> std::io::Result<()> {
        write_file(&self.dep_dir().join("profile.d").join(script), content)
    }

    fn write_config_yml(&self, config: &BuildpackConfig) -> std::io::Result<()> {
        let yaml = serde_yaml::to_string(config).map_err(std::io::Error::other)?;
        write_file(&self.dep_dir().join("config.yml"), &yaml)
    }
}
