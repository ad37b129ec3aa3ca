use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use dockgate_common::DockgateConfig;
use tracing::*;

pub fn load_config(path: &Path) -> Result<DockgateConfig> {
    let config: DockgateConfig = Config::builder()
        .add_source(File::from(path))
        .add_source(Environment::with_prefix("DOCKGATE"))
        .build()
        .context("Could not load config")?
        .try_deserialize()
        .context("Could not parse config")?;

    config.validate();
    info!("Using config: {path:?}");
    Ok(config)
}
