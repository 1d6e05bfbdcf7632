//! Error types for the rasterq library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building the catalog or answering queries.
#[derive(Error, Debug)]
pub enum RasterError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TIFF decoder rejected the file.
    #[error("TIFF decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The file has no affine transform (ModelTransformation or tiepoint + pixel scale).
    #[error("Raster has no georeferencing: {path}")]
    MissingGeoreference { path: PathBuf },

    /// The pixel layout cannot be mapped to a single band 1 grid.
    #[error("Unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    /// Every pixel of band 1 is masked as no-data.
    #[error("Band 1 of {path} contains no valid pixels")]
    EmptyBand { path: PathBuf },

    /// The requested raster is not in the catalog.
    #[error("Raster {name} not found in the collection for this API")]
    NotFound { name: String },

    /// Coordinates fall outside the raster bounding box.
    #[error("Coordinates are outside the bounding box of the raster: x={x}, y={y}")]
    OutOfBounds { x: f64, y: f64 },

    /// Coordinates resolve to a pixel index outside the raster grid.
    #[error("Coordinates resolve outside the raster grid: row={row}, col={col} (grid is {height}x{width})")]
    OutsideGrid {
        row: i64,
        col: i64,
        width: usize,
        height: usize,
    },

    /// The raster carries no EPSG code, so geographic input cannot be converted.
    #[error("Raster {name} has no EPSG code; cannot convert geographic coordinates")]
    UnknownCrs { name: String },

    /// The EPSG code could not be turned into a projection, or the transform failed.
    #[error("Reprojection to EPSG:{epsg} failed: {message}")]
    Projection { epsg: u16, message: String },

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The raster directory does not exist or cannot be listed.
    #[error("Raster directory {path} is not readable: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RasterError {
    /// Whether the error is caused by the request rather than by the server.
    ///
    /// Not-found is reported separately by callers, so only the two
    /// coordinate failures count here.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            RasterError::OutOfBounds { .. } | RasterError::OutsideGrid { .. }
        )
    }
}

/// Result type alias using [`RasterError`].
pub type Result<T> = std::result::Result<T, RasterError>;
