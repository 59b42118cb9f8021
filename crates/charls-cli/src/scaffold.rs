//! Project scaffolding for `charls-cli init`.
//!
//! Creates the data/output directory layout and writes the default
//! `charls.toml`. An existing config is only replaced with `force`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use charls_model::{DEFAULT_CONFIG_FILENAME, Settings};

/// What `init` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub root: PathBuf,
    /// Layout directories that did not exist before.
    pub created_dirs: Vec<PathBuf>,
    pub config: PathBuf,
    /// False when an existing config was kept.
    pub config_written: bool,
}

pub fn init_project(root: &Path, force: bool) -> Result<InitReport> {
    let settings = Settings::default();
    let mut created_dirs = Vec::new();
    for relative in settings.paths.layout() {
        let dir = root.join(relative);
        if dir.is_dir() {
            continue;
        }
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        created_dirs.push(dir);
    }

    let config = root.join(DEFAULT_CONFIG_FILENAME);
    let config_written = force || !config.exists();
    if config_written {
        let content = settings.to_toml_string().context("render default config")?;
        fs::write(&config, content).with_context(|| format!("write {}", config.display()))?;
    }

    info!(
        root = %root.display(),
        created = created_dirs.len(),
        config_written,
        "project initialized"
    );
    Ok(InitReport {
        root: root.to_path_buf(),
        created_dirs,
        config,
        config_written,
    })
}
