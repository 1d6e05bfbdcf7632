use anyhow::{Context, Result};
use rasterq::{projection, BoundingBox, PixelValue};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct InfoResponse {
    image_name: String,
    image_epsg: Option<u16>,
    path: String,
    width: usize,
    height: usize,
    nodata: Option<f64>,
    minimum_pixel_value: PixelValue,
    maximum_pixel_value: PixelValue,
    mean_pixel_value: f64,
    bounding_box: BoundingBox,
}

pub fn run(data_dir: Option<PathBuf>, name: String, json: bool) -> Result<()> {
    let manager = super::load_manager(data_dir)?;
    let descriptor = manager
        .get_raster_statistics(&name)
        .with_context(|| format!("Raster '{}' is not in the catalog", name))?;

    if json {
        let response = InfoResponse {
            image_name: descriptor.image_name.clone(),
            image_epsg: descriptor.image_epsg,
            path: descriptor.path.display().to_string(),
            width: descriptor.width,
            height: descriptor.height,
            nodata: descriptor.nodata,
            minimum_pixel_value: descriptor.minimum_pixel_value,
            maximum_pixel_value: descriptor.maximum_pixel_value,
            mean_pixel_value: descriptor.mean_pixel_value,
            bounding_box: descriptor.bounding_box,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let bbox = &descriptor.bounding_box;
    let crs = match descriptor.image_epsg {
        Some(epsg) if projection::is_geographic(epsg) => format!("EPSG:{} (geographic)", epsg),
        Some(epsg) => format!("EPSG:{} (projected)", epsg),
        None => "unknown".to_string(),
    };

    println!("Raster: {}", descriptor.image_name);
    println!("  Path: {}", descriptor.path.display());
    println!("  CRS: {}", crs);
    println!(
        "  Size: {} x {} ({} pixels)",
        descriptor.width,
        descriptor.height,
        descriptor.width * descriptor.height
    );
    match descriptor.nodata {
        Some(nodata) => println!("  No-data: {}", nodata),
        None => println!("  No-data: none"),
    }

    println!();
    println!("Bounds (native CRS):");
    println!("  West:  {}", bbox.min_longitude);
    println!("  South: {}", bbox.min_latitude);
    println!("  East:  {}", bbox.max_longitude);
    println!("  North: {}", bbox.max_latitude);

    // Corner positions in degrees for projected rasters
    if let Some(epsg) = descriptor
        .image_epsg
        .filter(|epsg| !projection::is_geographic(*epsg))
    {
        let sw = projection::to_wgs84(epsg, bbox.min_longitude, bbox.min_latitude);
        let ne = projection::to_wgs84(epsg, bbox.max_longitude, bbox.max_latitude);
        if let (Ok((west, south)), Ok((east, north))) = (sw, ne) {
            println!(
                "  WGS84 corners: SW ({:.6}, {:.6}), NE ({:.6}, {:.6})",
                west, south, east, north
            );
        }
    }

    println!();
    println!("Band 1 statistics (no-data excluded):");
    println!("  Min:  {}", descriptor.minimum_pixel_value);
    println!("  Max:  {}", descriptor.maximum_pixel_value);
    println!("  Mean: {:.4}", descriptor.mean_pixel_value);

    Ok(())
}
