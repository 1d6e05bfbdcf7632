use anyhow::Result;
use rasterq::BoundingBox;
use std::path::PathBuf;

pub fn run(data_dir: Option<PathBuf>) -> Result<()> {
    let manager = super::load_manager(data_dir)?;
    let catalog = manager.catalog();

    if catalog.is_empty() {
        println!("No rasters found in: {}", catalog.directory().display());
        return Ok(());
    }

    println!(
        "{:<24} {:>8} {:>12} {:>10}  {}",
        "NAME", "EPSG", "SIZE", "FILE", "BOUNDS"
    );
    println!("{}", "-".repeat(100));

    let mut total_size: u64 = 0;
    for descriptor in catalog.descriptors() {
        let file_size = std::fs::metadata(&descriptor.path)
            .map(|m| m.len())
            .unwrap_or(0);
        total_size += file_size;

        let epsg = descriptor
            .image_epsg
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<24} {:>8} {:>12} {:>10}  {}",
            descriptor.image_name,
            epsg,
            format!("{}x{}", descriptor.width, descriptor.height),
            format_size(file_size),
            format_bounds(&descriptor.bounding_box)
        );
    }

    let stats = catalog.build_stats();

    // Summary
    println!();
    println!("Summary:");
    println!("  Rasters: {}", catalog.len());
    if stats.files_failed > 0 {
        println!("  Skipped (unreadable): {}", stats.files_failed);
    }
    if stats.duplicates > 0 {
        println!("  Skipped (duplicate name): {}", stats.duplicates);
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Data directory: {}", catalog.directory().display());

    Ok(())
}

fn format_bounds(bbox: &BoundingBox) -> String {
    format!(
        "[{:.4}, {:.4}, {:.4}, {:.4}]",
        bbox.min_longitude, bbox.min_latitude, bbox.max_longitude, bbox.max_latitude
    )
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
