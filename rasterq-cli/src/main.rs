use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Raster pixel and statistics CLI tool
#[derive(Parser)]
#[command(name = "rasterq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing GeoTIFF rasters
    #[arg(short, long, env = "RASTERQ_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log catalog details (skipped files, duplicates)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the pixel value of a raster at a coordinate
    Query {
        /// Raster name (file name without extension)
        name: String,

        /// Latitude in decimal degrees (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Query pixel values for every row of a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_pixels.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for the raster name
        #[arg(long, default_value = "image_name")]
        image_col: String,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display metadata and statistics of a raster
    Info {
        /// Raster name (file name without extension)
        name: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List rasters in the catalog
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "rasterq=debug" } else { "rasterq=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            name,
            lat,
            lon,
            json,
        } => commands::query::run(cli.data_dir, name, lat, lon, json),
        Commands::Batch {
            input,
            output,
            image_col,
            lat_col,
            lon_col,
        } => commands::batch::run(cli.data_dir, input, output, image_col, lat_col, lon_col),
        Commands::Info { name, json } => commands::info::run(cli.data_dir, name, json),
        Commands::List => commands::list::run(cli.data_dir),
    }
}
