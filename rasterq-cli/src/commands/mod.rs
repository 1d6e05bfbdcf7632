pub mod batch;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{Context, Result};
use rasterq::{AppConfig, RasterQueryManager};
use std::path::PathBuf;

/// Build the query manager from `--data-dir`, or from `BASE_APP_DIRECTORY` when unset.
pub fn load_manager(data_dir: Option<PathBuf>) -> Result<RasterQueryManager> {
    let config = match data_dir {
        Some(dir) => AppConfig::new(dir),
        None => AppConfig::from_env().context(
            "No raster directory given. Use --data-dir, set RASTERQ_DATA_DIR or BASE_APP_DIRECTORY",
        )?,
    };

    RasterQueryManager::from_config(&config).with_context(|| {
        format!(
            "Failed to build raster catalog from {}",
            config.raster_dir().display()
        )
    })
}
