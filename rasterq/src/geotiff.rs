//! GeoTIFF decoding: georeferencing, CRS and band 1 samples.
//!
//! This module provides [`GeoTiff`], a fully decoded view of the first band of a
//! GeoTIFF file together with the metadata needed to locate pixels in space.

use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::catalog::BoundingBox;
use crate::error::{RasterError, Result};
use crate::stats::{masked_statistics, BandStatistics};
use crate::transform::GeoTransform;

// GeoTIFF tag IDs
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

// GeoKey IDs
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

/// GeoKey value for `RasterPixelIsPoint`.
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// GeoKey value marking a user-defined (non-EPSG) CRS.
const USER_DEFINED: u16 = 32767;

/// Numeric family of the band's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Unsigned integer samples (u8, u16, u32, u64).
    Unsigned,
    /// Signed integer samples (i8, i16, i32, i64).
    Signed,
    /// IEEE floating-point samples (f32, f64).
    Float,
}

impl SampleKind {
    /// Returns true for integer sample types.
    pub fn is_integer(&self) -> bool {
        !matches!(self, SampleKind::Float)
    }
}

/// A single pixel value, typed after the band it was read from.
///
/// Integer bands produce [`PixelValue::Int`]; floating-point bands produce
/// [`PixelValue::Float`]. Serialises as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PixelValue {
    Int(i64),
    Float(f64),
}

impl PixelValue {
    /// Wrap a decoded sample according to the band's sample kind.
    pub fn from_sample(kind: SampleKind, value: f64) -> Self {
        if kind.is_integer() {
            PixelValue::Int(value as i64)
        } else {
            PixelValue::Float(value)
        }
    }
}

impl fmt::Display for PixelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelValue::Int(v) => write!(f, "{}", v),
            PixelValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A decoded GeoTIFF: band 1 samples plus georeferencing.
///
/// The file is memory-mapped while decoding and released as soon as
/// [`GeoTiff::open`] returns; no handle outlives the call.
///
/// # Example
///
/// ```ignore
/// use rasterq::GeoTiff;
///
/// let raster = GeoTiff::open("/data/raster/data/basemap.tif")?;
/// let value = raster.value_at_coords(0.5, 50.5)?;
/// println!("Pixel value: {}", value);
/// ```
pub struct GeoTiff {
    /// Source file
    path: PathBuf,
    /// Grid width in pixels
    width: usize,
    /// Grid height in pixels
    height: usize,
    /// Pixel to raster-coordinate mapping
    transform: GeoTransform,
    /// EPSG code from the GeoKey directory, if any
    epsg: Option<u16>,
    /// GDAL no-data value, if any
    nodata: Option<f64>,
    /// Sample family of band 1
    kind: SampleKind,
    /// Band 1 samples, row-major
    band: Vec<f64>,
}

impl GeoTiff {
    /// Open and decode a GeoTIFF file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or memory-mapped
    /// - The TIFF structure cannot be decoded
    /// - The file carries no affine transform, or one that cannot be inverted
    /// - The pixel layout does not divide into whole samples per pixel
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        // SAFETY: Memory mapping is safe as long as the file is not modified
        // while mapped. We open the file read-only and drop the mapping before returning.
        let mmap = unsafe { Mmap::map(&file)? };

        let mut decoder = Decoder::new(Cursor::new(&mmap[..]))?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        if width == 0 || height == 0 {
            return Err(RasterError::UnsupportedLayout(format!(
                "{} has an empty {}x{} grid",
                path.display(),
                width,
                height
            )));
        }

        let geokeys = decoder
            .get_tag_u16_vec(Tag::from_u16_exhaustive(TAG_GEO_KEY_DIRECTORY))
            .ok()
            .map(|raw| GeoKeys::parse(&raw))
            .unwrap_or_default();

        let transform = read_transform(&mut decoder)
            .ok_or_else(|| RasterError::MissingGeoreference {
                path: path.to_path_buf(),
            })?;
        let transform = if geokeys.pixel_is_point() {
            transform.shifted_to_corner()
        } else {
            transform
        };
        if !transform.is_invertible() {
            return Err(RasterError::UnsupportedLayout(format!(
                "{} has a non-invertible geotransform",
                path.display()
            )));
        }

        let nodata = decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_NODATA))
            .ok()
            .and_then(|s| parse_nodata(&s));

        let (kind, samples) = convert_decoding_result(decoder.read_image()?)?;
        let band = first_band(samples, width * height)?;

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            transform,
            epsg: geokeys.epsg(),
            nodata,
            kind,
            band,
        })
    }

    /// Returns the source file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the grid width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the affine transform of the grid.
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Returns the EPSG code, or `None` if the file has no resolvable CRS.
    pub fn epsg(&self) -> Option<u16> {
        self.epsg
    }

    /// Returns the no-data value, if declared.
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Returns the sample family of band 1.
    pub fn sample_kind(&self) -> SampleKind {
        self.kind
    }

    /// Band 1 samples in row-major order.
    pub fn band(&self) -> &[f64] {
        &self.band
    }

    /// Extent of the grid in the raster's native coordinates.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// Masked statistics of band 1 (no-data and NaN cells excluded).
    ///
    /// Returns `None` when every cell is masked.
    pub fn statistics(&self) -> Option<BandStatistics> {
        masked_statistics(&self.band, self.kind, self.nodata)
    }

    /// Read band 1 at a row/column index.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::OutsideGrid`] if the index is outside the grid.
    pub fn value_at(&self, row: i64, col: i64) -> Result<PixelValue> {
        let outside = RasterError::OutsideGrid {
            row,
            col,
            width: self.width,
            height: self.height,
        };

        let (r, c) = match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < self.height && c < self.width => (r, c),
            _ => return Err(outside),
        };

        Ok(PixelValue::from_sample(
            self.kind,
            self.band[r * self.width + c],
        ))
    }

    /// Read band 1 at raster coordinates (native CRS).
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::OutsideGrid`] if the coordinates fall off the grid,
    /// or [`RasterError::OutOfBounds`] if they are not finite.
    pub fn value_at_coords(&self, x: f64, y: f64) -> Result<PixelValue> {
        let (row, col) = self
            .transform
            .index(x, y)
            .ok_or(RasterError::OutOfBounds { x, y })?;
        self.value_at(row, col)
    }
}

/// Subset of the GeoKey directory used by this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GeoKeys {
    raster_type: Option<u16>,
    geographic: Option<u16>,
    projected: Option<u16>,
}

impl GeoKeys {
    /// Parse a GeoKeyDirectory SHORT array.
    ///
    /// Layout: `[version, revision, minor, count, (key, location, count, value)*]`.
    /// Only keys stored inline (location 0) are read.
    fn parse(raw: &[u16]) -> Self {
        let mut keys = Self::default();
        if raw.len() < 4 {
            return keys;
        }

        let count = raw[3] as usize;
        for entry in raw[4..].chunks_exact(4).take(count) {
            let (key_id, location, value) = (entry[0], entry[1], entry[3]);
            if location != 0 {
                continue;
            }
            match key_id {
                GT_RASTER_TYPE_GEO_KEY => keys.raster_type = Some(value),
                GEOGRAPHIC_TYPE_GEO_KEY => keys.geographic = Some(value),
                PROJECTED_CS_TYPE_GEO_KEY => keys.projected = Some(value),
                _ => {}
            }
        }
        keys
    }

    /// EPSG code of the CRS: projected code first, then geographic.
    ///
    /// A user-defined projected CRS has no code, even with a geographic base.
    fn epsg(&self) -> Option<u16> {
        let usable = |code: &u16| *code != 0 && *code != USER_DEFINED;
        match self.projected {
            Some(code) => Some(code).filter(usable),
            None => self.geographic.filter(usable),
        }
    }

    fn pixel_is_point(&self) -> bool {
        self.raster_type == Some(RASTER_PIXEL_IS_POINT)
    }
}

/// Read the affine transform, preferring ModelTransformation over tiepoint + scale.
fn read_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    if let Ok(matrix) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TRANSFORMATION))
    {
        if let Some(transform) = GeoTransform::from_model_transformation(&matrix) {
            return Some(transform);
        }
    }

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))
        .ok()?;
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))
        .ok()?;
    GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale)
}

/// Parse the GDAL_NODATA ASCII tag ("0", "-9999", "nan").
fn parse_nodata(raw: &str) -> Option<f64> {
    raw.trim_end_matches('\0').trim().parse().ok()
}

/// Widen decoded samples to f64, remembering their numeric family.
fn convert_decoding_result(result: DecodingResult) -> Result<(SampleKind, Vec<f64>)> {
    let converted = match result {
        DecodingResult::U8(data) => (SampleKind::Unsigned, data.into_iter().map(f64::from).collect()),
        DecodingResult::U16(data) => (SampleKind::Unsigned, data.into_iter().map(f64::from).collect()),
        DecodingResult::U32(data) => (SampleKind::Unsigned, data.into_iter().map(f64::from).collect()),
        DecodingResult::U64(data) => (SampleKind::Unsigned, data.into_iter().map(|v| v as f64).collect()),
        DecodingResult::I8(data) => (SampleKind::Signed, data.into_iter().map(f64::from).collect()),
        DecodingResult::I16(data) => (SampleKind::Signed, data.into_iter().map(f64::from).collect()),
        DecodingResult::I32(data) => (SampleKind::Signed, data.into_iter().map(f64::from).collect()),
        DecodingResult::I64(data) => (SampleKind::Signed, data.into_iter().map(|v| v as f64).collect()),
        DecodingResult::F32(data) => (SampleKind::Float, data.into_iter().map(f64::from).collect()),
        DecodingResult::F64(data) => (SampleKind::Float, data),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(RasterError::UnsupportedLayout(
                "unsupported sample format".to_string(),
            ))
        }
    };
    Ok(converted)
}

/// Keep only band 1 of pixel-interleaved samples.
fn first_band(samples: Vec<f64>, pixels: usize) -> Result<Vec<f64>> {
    if samples.len() < pixels || samples.len() % pixels != 0 {
        return Err(RasterError::UnsupportedLayout(format!(
            "{} samples do not cover {} pixels",
            samples.len(),
            pixels
        )));
    }

    let per_pixel = samples.len() / pixels;
    if per_pixel == 1 {
        return Ok(samples);
    }
    Ok(samples.into_iter().step_by(per_pixel).collect())
}
