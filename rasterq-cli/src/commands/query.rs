use anyhow::{Context, Result};
use rasterq::PixelValue;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct PixelResponse {
    image_name: String,
    lat: f64,
    lon: f64,
    pixel_value: PixelValue,
}

pub fn run(data_dir: Option<PathBuf>, name: String, lat: f64, lon: f64, json: bool) -> Result<()> {
    let manager = super::load_manager(data_dir)?;

    let pixel_value = manager
        .query_pixel(&name, lon, lat)
        .with_context(|| format!("Failed to query {} at lat={}, lon={}", name, lat, lon))?;

    if json {
        let response = PixelResponse {
            image_name: name,
            lat,
            lon,
            pixel_value,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", pixel_value);
    }

    Ok(())
}
