//! Query operations over a raster catalog.

use std::path::Path;

use crate::catalog::{RasterCatalog, RasterDescriptor};
use crate::config::AppConfig;
use crate::error::{RasterError, Result};
use crate::geotiff::{GeoTiff, PixelValue};
use crate::projection;

/// Answers pixel and statistics queries against one [`RasterCatalog`].
///
/// The manager is immutable once created and can be shared between threads
/// (typically behind an `Arc`). Pixel reads open the raster file on every call.
///
/// # Example
///
/// ```ignore
/// use rasterq::RasterQueryManager;
///
/// let manager = RasterQueryManager::from_directory("/data/raster/data")?;
///
/// if manager.contains("basemap") {
///     let value = manager.query_pixel("basemap", 2.35, 48.85)?;
///     println!("Pixel value: {}", value);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RasterQueryManager {
    catalog: RasterCatalog,
}

impl RasterQueryManager {
    /// Wrap an existing catalog.
    pub fn new(catalog: RasterCatalog) -> Self {
        Self { catalog }
    }

    /// Build the catalog from a directory and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn from_directory<P: AsRef<Path>>(directory: P) -> Result<Self> {
        RasterCatalog::build(directory).map(Self::new)
    }

    /// Build the catalog from the configured raster directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::from_directory(config.raster_dir())
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &RasterCatalog {
        &self.catalog
    }

    /// Directory the catalog was built from.
    pub fn raster_dir(&self) -> &Path {
        self.catalog.directory()
    }

    /// Whether a raster with this name is in the catalog.
    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    /// Whether `(x, y)` lies inside the raster's bounding box, edges included.
    ///
    /// Coordinates must be in the raster's native CRS. Returns `false` for
    /// unknown rasters.
    pub fn check_coordinates(&self, name: &str, x: f64, y: f64) -> bool {
        self.catalog
            .get(name)
            .is_some_and(|descriptor| descriptor.bounding_box.contains(x, y))
    }

    /// Convert a WGS84 longitude/latitude into the raster's native CRS.
    ///
    /// Geographic rasters get the input back unchanged.
    ///
    /// # Errors
    ///
    /// - [`RasterError::UnknownCrs`] if the raster has no EPSG code
    /// - [`RasterError::Projection`] if the code cannot be resolved
    /// - [`RasterError::OutOfBounds`] if the point cannot be projected
    pub fn convert(&self, lon: f64, lat: f64, descriptor: &RasterDescriptor) -> Result<(f64, f64)> {
        let epsg = descriptor.image_epsg.ok_or_else(|| RasterError::UnknownCrs {
            name: descriptor.image_name.clone(),
        })?;
        projection::from_wgs84(epsg, lon, lat)
    }

    /// Read band 1 at native coordinates `(x, y)`.
    ///
    /// # Errors
    ///
    /// - [`RasterError::NotFound`] if the raster is not in the catalog
    /// - [`RasterError::OutsideGrid`] if the point maps outside the grid
    /// - Read errors if the file changed or vanished since the catalog was built
    pub fn get_pixel_value(&self, name: &str, x: f64, y: f64) -> Result<PixelValue> {
        let descriptor = self.descriptor(name)?;
        let raster = GeoTiff::open(&descriptor.path)?;
        raster.value_at_coords(x, y)
    }

    /// Metadata and statistics of a raster.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::NotFound`] if the raster is not in the catalog.
    pub fn get_raster_statistics(&self, name: &str) -> Result<&RasterDescriptor> {
        self.descriptor(name)
    }

    /// Pixel value at a WGS84 longitude/latitude.
    ///
    /// Converts into the raster's CRS, checks the bounding box and reads the pixel.
    ///
    /// # Errors
    ///
    /// - [`RasterError::NotFound`] if the raster is not in the catalog
    /// - [`RasterError::OutOfBounds`] if the point is outside the bounding box or
    ///   cannot be projected into the raster's CRS
    /// - [`RasterError::OutsideGrid`] if the point maps outside the grid
    /// - Conversion and read errors otherwise
    pub fn query_pixel(&self, name: &str, lon: f64, lat: f64) -> Result<PixelValue> {
        let descriptor = self.descriptor(name)?;
        let (x, y) = self.convert(lon, lat, descriptor)?;

        if !self.check_coordinates(name, x, y) {
            return Err(RasterError::OutOfBounds { x, y });
        }

        self.get_pixel_value(name, x, y)
    }

    fn descriptor(&self, name: &str) -> Result<&RasterDescriptor> {
        self.catalog.get(name).ok_or_else(|| RasterError::NotFound {
            name: name.to_string(),
        })
    }
}
