//! Raster catalog: descriptors of every GeoTIFF in a directory.
//!
//! The catalog is built once by scanning a directory and is read-only afterwards.
//! Files that cannot be decoded are logged and left out; only an unreadable
//! directory fails the build.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{RasterError, Result};
use crate::geotiff::{GeoTiff, PixelValue};

/// Rectangle enclosing a raster, in the raster's native coordinates.
///
/// The field names follow the HTTP payload; for projected rasters the values
/// are eastings/northings rather than degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoundingBox {
    /// Western boundary.
    pub min_longitude: f64,
    /// Southern boundary.
    pub min_latitude: f64,
    /// Eastern boundary.
    pub max_longitude: f64,
    /// Northern boundary.
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `min_longitude` - Western boundary
    /// * `min_latitude` - Southern boundary
    /// * `max_longitude` - Eastern boundary
    /// * `max_latitude` - Northern boundary
    pub fn new(min_longitude: f64, min_latitude: f64, max_longitude: f64, max_latitude: f64) -> Self {
        Self {
            min_longitude,
            min_latitude,
            max_longitude,
            max_latitude,
        }
    }

    /// Inclusive point-in-rectangle test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.min_longitude <= x
            && x <= self.max_longitude
            && self.min_latitude <= y
            && y <= self.max_latitude
    }
}

/// Metadata of one raster, computed when the catalog is built.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDescriptor {
    /// File name without its final extension.
    pub image_name: String,
    /// EPSG code, or `None` when the file has no resolvable CRS.
    pub image_epsg: Option<u16>,
    pub maximum_pixel_value: PixelValue,
    pub minimum_pixel_value: PixelValue,
    pub mean_pixel_value: f64,
    pub bounding_box: BoundingBox,
    /// Source file.
    pub path: PathBuf,
    /// Grid width in pixels.
    pub width: usize,
    /// Grid height in pixels.
    pub height: usize,
    /// No-data value of band 1.
    pub nodata: Option<f64>,
}

impl RasterDescriptor {
    /// Open a GeoTIFF and describe it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be decoded, or
    /// [`RasterError::EmptyBand`] if band 1 has no valid pixel.
    pub fn from_file<P: AsRef<Path>>(path: P, image_name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let raster = GeoTiff::open(path)?;
        let stats = raster.statistics().ok_or_else(|| RasterError::EmptyBand {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            image_name: image_name.into(),
            image_epsg: raster.epsg(),
            maximum_pixel_value: stats.maximum,
            minimum_pixel_value: stats.minimum,
            mean_pixel_value: stats.mean,
            bounding_box: raster.bounds(),
            path: path.to_path_buf(),
            width: raster.width(),
            height: raster.height(),
            nodata: raster.nodata(),
        })
    }
}

/// Outcome counters of a catalog build.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Raster files found in the directory.
    pub files_scanned: u64,
    /// Files that made it into the catalog.
    pub rasters_loaded: u64,
    /// Files skipped because they could not be read.
    pub files_failed: u64,
    /// Files skipped because an earlier file had the same name.
    pub duplicates: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Mapping from raster name to [`RasterDescriptor`].
///
/// # Example
///
/// ```ignore
/// use rasterq::RasterCatalog;
///
/// let catalog = RasterCatalog::build("/data/raster/data")?;
/// for name in catalog.names() {
///     println!("{}", name);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RasterCatalog {
    directory: PathBuf,
    rasters: HashMap<String, RasterDescriptor>,
    stats: BuildStats,
}

impl RasterCatalog {
    /// Scan `directory` and describe every `.tif` / `.tiff` file in it.
    ///
    /// Files are visited in sorted order. When two files share a name
    /// (`a.tif` and `a.tiff`), the first one wins and the other is logged.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::DirectoryUnreadable`] if the directory does not
    /// exist or cannot be listed. Per-file failures never fail the build.
    pub fn build<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref();
        let start = Instant::now();
        let mut stats = BuildStats::default();
        let mut rasters = HashMap::new();

        for path in scan_raster_files(directory)? {
            let Some(name) = raster_name(&path) else {
                continue;
            };
            stats.files_scanned += 1;

            if rasters.contains_key(&name) {
                tracing::warn!(
                    image_name = %name,
                    file = %path.display(),
                    "Duplicate raster name, keeping the first file"
                );
                stats.duplicates += 1;
                continue;
            }

            match RasterDescriptor::from_file(&path, name.clone()) {
                Ok(descriptor) => {
                    tracing::debug!(
                        image_name = %name,
                        epsg = ?descriptor.image_epsg,
                        width = descriptor.width,
                        height = descriptor.height,
                        "Raster added to catalog"
                    );
                    rasters.insert(name, descriptor);
                    stats.rasters_loaded += 1;
                }
                Err(e) => {
                    tracing::error!(file = %path.display(), error = %e, "Skipping raster");
                    stats.files_failed += 1;
                }
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            directory = %directory.display(),
            loaded = stats.rasters_loaded,
            failed = stats.files_failed,
            duplicates = stats.duplicates,
            elapsed_ms = stats.elapsed_ms,
            "Raster catalog built"
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            rasters,
            stats,
        })
    }

    /// Assemble a catalog from existing descriptors without touching the filesystem.
    ///
    /// Later descriptors with an already-used name are ignored.
    pub fn from_descriptors<P, I>(directory: P, descriptors: I) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = RasterDescriptor>,
    {
        let mut rasters = HashMap::new();
        for descriptor in descriptors {
            rasters
                .entry(descriptor.image_name.clone())
                .or_insert(descriptor);
        }
        let stats = BuildStats {
            rasters_loaded: rasters.len() as u64,
            ..BuildStats::default()
        };

        Self {
            directory: directory.as_ref().to_path_buf(),
            rasters,
            stats,
        }
    }

    /// Look up a raster by name.
    pub fn get(&self, name: &str) -> Option<&RasterDescriptor> {
        self.rasters.get(name)
    }

    /// Whether a raster with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.rasters.contains_key(name)
    }

    /// Raster names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rasters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Descriptors sorted by name.
    pub fn descriptors(&self) -> Vec<&RasterDescriptor> {
        let mut descriptors: Vec<&RasterDescriptor> = self.rasters.values().collect();
        descriptors.sort_unstable_by(|a, b| a.image_name.cmp(&b.image_name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }

    /// Directory the catalog was built from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Counters from the build.
    pub fn build_stats(&self) -> &BuildStats {
        &self.stats
    }
}

/// List raster files (`.tif` / `.tiff`, any case) in a directory, sorted by path.
///
/// # Errors
///
/// Returns [`RasterError::DirectoryUnreadable`] if the directory cannot be listed.
pub fn scan_raster_files<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    let entries = std::fs::read_dir(directory).map_err(|source| RasterError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && raster_name(path).is_some())
        .collect();
    files.sort();
    Ok(files)
}

/// Catalog name of a raster file: the file name without its final extension.
///
/// Returns `None` for anything that is not a `.tif` / `.tiff` file.
pub fn raster_name(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if !extension.eq_ignore_ascii_case("tif") && !extension.eq_ignore_ascii_case("tiff") {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}
