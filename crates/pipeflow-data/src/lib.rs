//! Pipeflow Data -- loads pump tunables from RON, TOML, or JSON files.
//!
//! The loader looks for a `pumps.{ron,toml,json}` file in a data directory.
//! A missing file is not an error: the pump system runs on defaults.

pub mod loader;

pub use loader::{DataLoadError, Format};

use std::path::Path;

use pipeflow_core::config::PumpConfig;
use tracing::{debug, info};

/// Base name of the pump config file.
pub const PUMP_CONFIG_FILE: &str = "pumps";

/// Load and validate the pump config from `dir`.
///
/// Returns [`PumpConfig::default`] when the directory holds no pump file.
pub fn load_pump_config(dir: &Path) -> Result<PumpConfig, DataLoadError> {
    let Some(path) = loader::find_data_file(dir, PUMP_CONFIG_FILE)? else {
        debug!(dir = %dir.display(), "no pump config found, using defaults");
        return Ok(PumpConfig::default());
    };

    let config: PumpConfig = loader::deserialize_file(&path)?;
    config.validate().map_err(|source| DataLoadError::Invalid {
        file: path.clone(),
        source,
    })?;

    info!(
        file = %path.display(),
        per_tick_transfer = config.per_tick_transfer(),
        "loaded pump config"
    );
    Ok(config)
}
