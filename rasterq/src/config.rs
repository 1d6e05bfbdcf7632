//! Application configuration.

use std::path::{Path, PathBuf};

use crate::error::{RasterError, Result};

/// Environment variable holding the application base directory.
pub const BASE_DIR_ENV: &str = "BASE_APP_DIRECTORY";

/// Environment variable holding the application name.
pub const APP_NAME_ENV: &str = "BASE_APP_NAME";

pub const DEFAULT_APP_NAME: &str = "Raster Query Application";

/// Where rasters live and what the application calls itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    raster_dir: PathBuf,
    app_name: String,
}

impl AppConfig {
    /// Configuration reading rasters from `raster_dir` directly.
    pub fn new<P: AsRef<Path>>(raster_dir: P) -> Self {
        Self {
            raster_dir: raster_dir.as_ref().to_path_buf(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Configuration for a base directory; rasters are read from `<base>/raster/data`.
    pub fn from_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self::new(base_dir.as_ref().join("raster").join("data"))
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Required | Default | Description |
    /// |----------|----------|---------|-------------|
    /// | `BASE_APP_DIRECTORY` | Yes | - | Base directory; rasters are in `raster/data` below it |
    /// | `BASE_APP_NAME` | No | Raster Query Application | Name used in logs and API docs |
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Config`] if `BASE_APP_DIRECTORY` is not set or empty.
    pub fn from_env() -> Result<Self> {
        let base_dir = std::env::var(BASE_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                RasterError::Config(format!("{} environment variable not set", BASE_DIR_ENV))
            })?;

        let config = Self::from_base_dir(base_dir);
        Ok(match std::env::var(APP_NAME_ENV) {
            Ok(name) if !name.trim().is_empty() => config.app_name(name),
            _ => config,
        })
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Directory scanned for rasters.
    pub fn raster_dir(&self) -> &Path {
        &self.raster_dir
    }

    pub fn name(&self) -> &str {
        &self.app_name
    }
}
