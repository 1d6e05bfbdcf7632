//! Minimal GeoTIFF writer for unit-test fixtures.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::colortype::ColorType;
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

use crate::projection::is_geographic;

/// Georeferencing written into a fixture.
#[derive(Debug, Clone, Default)]
pub(crate) struct Georef {
    /// (origin x, origin y, pixel size); `None` writes no transform tags
    grid: Option<(f64, f64, f64)>,
    epsg: Option<u16>,
    nodata: Option<String>,
    pixel_is_point: bool,
}

impl Georef {
    pub(crate) fn geographic(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self {
            grid: Some((origin_x, origin_y, pixel_size)),
            epsg: Some(4326),
            ..Self::default()
        }
    }

    pub(crate) fn projected(epsg: u16, origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self {
            grid: Some((origin_x, origin_y, pixel_size)),
            epsg: Some(epsg),
            ..Self::default()
        }
    }

    /// A transform but no CRS keys.
    pub(crate) fn without_crs(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self {
            grid: Some((origin_x, origin_y, pixel_size)),
            ..Self::default()
        }
    }

    pub(crate) fn none() -> Self {
        Self::default()
    }

    pub(crate) fn nodata(mut self, value: &str) -> Self {
        self.nodata = Some(value.to_string());
        self
    }

    pub(crate) fn pixel_is_point(mut self) -> Self {
        self.pixel_is_point = true;
        self
    }

    fn geokeys(&self) -> Vec<u16> {
        let raster_type = if self.pixel_is_point { 2 } else { 1 };
        let mut entries: Vec<[u16; 4]> = Vec::new();

        match self.epsg {
            Some(code) if is_geographic(code) => {
                entries.push([1024, 0, 1, 2]);
                entries.push([1025, 0, 1, raster_type]);
                entries.push([2048, 0, 1, code]);
            }
            Some(code) => {
                entries.push([1024, 0, 1, 1]);
                entries.push([1025, 0, 1, raster_type]);
                entries.push([3072, 0, 1, code]);
            }
            None => entries.push([1025, 0, 1, raster_type]),
        }

        let mut keys = vec![1, 1, 0, entries.len() as u16];
        keys.extend(entries.into_iter().flatten());
        keys
    }
}

/// Write a single-image GeoTIFF with the given samples and georeferencing.
pub(crate) fn write_geotiff<C>(
    path: &Path,
    width: u32,
    height: u32,
    data: &[C::Inner],
    georef: &Georef,
) where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let file = BufWriter::new(File::create(path).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<C>(width, height).unwrap();

    if let Some((origin_x, origin_y, size)) = georef.grid {
        let dir = image.encoder();
        dir.write_tag(Tag::from_u16_exhaustive(33550), &[size, size, 0.0][..])
            .unwrap();
        dir.write_tag(
            Tag::from_u16_exhaustive(33922),
            &[0.0, 0.0, 0.0, origin_x, origin_y, 0.0][..],
        )
        .unwrap();
        dir.write_tag(Tag::from_u16_exhaustive(34735), &georef.geokeys()[..])
            .unwrap();
    }
    if let Some(nodata) = &georef.nodata {
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(42113), nodata.as_str())
            .unwrap();
    }

    image.write_data(data).unwrap();
}
