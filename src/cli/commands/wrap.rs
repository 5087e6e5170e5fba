use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::super::args::WrapCommand;
use crate::config::{ConfigLoadResult, load_config};
use crate::core::orchestrator::{self, RunSummary};

/// Resolve the project root: `--root` if given, else the current directory.
pub fn resolve_root(root: Option<&PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root.clone(),
        None => env::current_dir().context("Failed to read current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("Failed to resolve root: {}", root.display()))
}

/// Load the config file, apply CLI overrides and run the engine.
pub fn wrap(cmd: &WrapCommand, root: PathBuf) -> Result<RunSummary> {
    let ConfigLoadResult { mut config, from_file } = load_config(&root)?;
    debug!(from_file, root = %root.display(), "configuration loaded");

    if let Some(pattern) = &cmd.pattern {
        config.source_pattern = pattern.clone();
    }
    if let Some(mode) = cmd.mode {
        config.mode = mode;
    }
    if let Some(framework) = cmd.framework {
        config.framework = framework;
    }
    if cmd.dry_run {
        config.dry_run = true;
    }
    if cmd.jobs.is_some() {
        config.workers = cmd.jobs;
    }

    let resolved = config.resolve(&root)?;
    let summary = orchestrator::run(resolved)?;
    Ok(summary)
}
