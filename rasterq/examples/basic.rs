//! Basic example demonstrating rasterq library usage.
//!
//! Run with: cargo run --example basic -- /path/to/raster/dir <image_name> <lat> <lon>

use rasterq::{RasterError, RasterQueryManager};
use std::env;

fn main() -> Result<(), RasterError> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 4 {
        eprintln!("Usage: cargo run --example basic -- /path/to/raster/dir <image_name> <lat> <lon>");
        std::process::exit(1);
    }

    let (Ok(lat), Ok(lon)) = (args[2].parse::<f64>(), args[3].parse::<f64>()) else {
        eprintln!("lat and lon must be numbers");
        std::process::exit(1);
    };

    let manager = RasterQueryManager::from_directory(&args[0])?;
    let name = &args[1];

    println!("Catalog: {} rasters", manager.catalog().len());
    for descriptor in manager.catalog().descriptors() {
        println!("  {} (EPSG: {:?})", descriptor.image_name, descriptor.image_epsg);
    }
    println!();

    match manager.query_pixel(name, lon, lat) {
        Ok(value) => println!("{} at ({}, {}): {}", name, lat, lon, value),
        Err(RasterError::NotFound { .. }) => println!("{}: not in the catalog", name),
        Err(e) if e.is_bad_request() => println!("{}: {}", name, e),
        Err(e) => return Err(e),
    }

    let stats = manager.get_raster_statistics(name)?;
    println!("\nStatistics:");
    println!("  Min: {}", stats.minimum_pixel_value);
    println!("  Max: {}", stats.maximum_pixel_value);
    println!("  Mean: {:.3}", stats.mean_pixel_value);

    Ok(())
}
