//! # rasterq - Raster Catalog and Pixel Queries
//!
//! Library for answering point and summary queries against a directory of
//! GeoTIFF rasters.
//!
//! ## Features
//!
//! - **Catalog**: scans a directory once and keeps per-raster metadata
//!   (bounding box, EPSG code, masked band 1 statistics)
//! - **Best effort**: files that cannot be decoded are logged and skipped
//! - **Reprojection**: WGS84 input is converted to each raster's CRS with `proj4rs`
//! - **Offline**: pure Rust TIFF decoding and EPSG database, no GDAL or PROJ needed
//!
//! ## Quick Start
//!
//! ```ignore
//! use rasterq::{AppConfig, RasterQueryManager};
//!
//! let config = AppConfig::from_env()?;
//! let manager = RasterQueryManager::from_config(&config)?;
//!
//! let value = manager.query_pixel("basemap", 2.35, 48.85)?;
//! println!("Pixel value: {}", value);
//!
//! let stats = manager.get_raster_statistics("basemap")?;
//! println!("Mean: {}", stats.mean_pixel_value);
//! ```
//!
//! ## Coordinates
//!
//! Bounding boxes are kept in each raster's native CRS. Query input is WGS84
//! longitude/latitude and is converted before the bounds check, so for projected
//! rasters the stored box is in metres, not degrees.
//!
//! ## Cargo features
//!
//! - `serde`: derives `Serialize` for [`PixelValue`] and [`BoundingBox`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod geotiff;
pub mod manager;
pub mod projection;
pub mod stats;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types at crate root for convenience
pub use catalog::{BoundingBox, BuildStats, RasterCatalog, RasterDescriptor};
pub use config::AppConfig;
pub use error::{RasterError, Result};
pub use geotiff::{GeoTiff, PixelValue, SampleKind};
pub use manager::RasterQueryManager;
pub use stats::BandStatistics;
pub use transform::GeoTransform;
