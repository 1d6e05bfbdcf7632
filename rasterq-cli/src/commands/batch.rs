use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rasterq::RasterQueryManager;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Value written for rows that could not be resolved.
const ERROR_VALUE: &str = "error";

/// Column names used to read a batch file.
struct Columns<'a> {
    image: &'a str,
    lat: &'a str,
    lon: &'a str,
}

pub fn run(
    data_dir: Option<PathBuf>,
    input: PathBuf,
    output: Option<PathBuf>,
    image_col: String,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "csv" {
        bail!("Unsupported file format: {}. Use .csv", extension);
    }

    let manager = super::load_manager(data_dir)?;

    let output_path = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "batch".to_string());
        input.with_file_name(format!("{}_pixels.csv", stem))
    });

    let columns = Columns {
        image: &image_col,
        lat: &lat_col,
        lon: &lon_col,
    };
    let failed = process_csv(&manager, &input, &output_path, &columns, true)?;

    if failed > 0 {
        eprintln!("{} rows could not be resolved", failed);
    }
    println!("Output written to: {}", output_path.display());
    Ok(())
}

/// Append a `pixel_value` column to every row of `input`.
///
/// Returns the number of rows that failed.
fn process_csv(
    manager: &RasterQueryManager,
    input: &Path,
    output_path: &Path,
    columns: &Columns<'_>,
    show_progress: bool,
) -> Result<u64> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let column_index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Column '{}' not found in CSV", name))
    };
    let image_idx = column_index(columns.image)?;
    let lat_idx = column_index(columns.lat)?;
    let lon_idx = column_index(columns.lon)?;

    // Collect records for progress bar
    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let pb = if show_progress {
        ProgressBar::new(records.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let output_file = File::create(output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    // Write header
    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("pixel_value");
    writer.write_record(&new_headers)?;

    let mut failed = 0;
    for record in records {
        let value = resolve_row(manager, &record, image_idx, lat_idx, lon_idx);
        let value = value.unwrap_or_else(|| {
            failed += 1;
            ERROR_VALUE.to_string()
        });

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&value);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    Ok(failed)
}

fn resolve_row(
    manager: &RasterQueryManager,
    record: &csv::StringRecord,
    image_idx: usize,
    lat_idx: usize,
    lon_idx: usize,
) -> Option<String> {
    let name = record.get(image_idx)?.trim();
    let lat: f64 = record.get(lat_idx)?.trim().parse().ok()?;
    let lon: f64 = record.get(lon_idx)?.trim().parse().ok()?;

    manager
        .query_pixel(name, lon, lat)
        .ok()
        .map(|value| value.to_string())
}
