//! Command implementations.

mod emit;
mod serve;
mod validate;

pub use emit::run_emit;
pub use serve::run_serve;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::ReportingBlueprint;
use std::path::Path;

/// Load and validate the configuration at `path`
fn load_blueprint(path: &Path) -> Result<ReportingBlueprint> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
