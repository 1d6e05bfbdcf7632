//! rasterq Service - HTTP microservice for raster pixel queries.
//!
//! A REST API over a directory of GeoTIFF rasters. The raster catalog is built
//! once at startup; each pixel query reads the raster file on demand.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BASE_APP_DIRECTORY` | Base directory; rasters are read from `raster/data` below it | Required |
//! | `BASE_APP_NAME` | Application name used in logs | "Raster Query Application" |
//! | `RASTERQ_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /images/{image_name}/query?lat=X&lon=Y` - Pixel value at coordinates
//! - `GET /images/{image_name}/stats` - Raster metadata and statistics
//! - `GET /images` - Catalog listing
//! - `GET /health` - Health check
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use rasterq::{AppConfig, RasterQueryManager};
use rasterq_service::{router, ApiDoc, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rasterq=info,rasterq_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("RASTERQ_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // Missing base directory or raster directory is fatal
    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    tracing::info!(
        app_name = config.name(),
        raster_dir = %config.raster_dir().display(),
        port = port,
        "Starting raster query service"
    );

    let manager = RasterQueryManager::from_config(&config).inspect_err(|e| {
        tracing::error!(error = %e, "Could not build raster catalog");
    })?;

    let stats = manager.catalog().build_stats();
    tracing::info!(
        rasters_loaded = stats.rasters_loaded,
        files_failed = stats.files_failed,
        duplicates = stats.duplicates,
        elapsed_ms = stats.elapsed_ms,
        "Catalog ready"
    );

    let state = Arc::new(AppState { manager });

    // Build router
    let app = router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
