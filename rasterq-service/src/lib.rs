//! rasterq Service Library
//!
//! HTTP handlers, router and OpenAPI document for the raster query service.
//! This library is used by both the rasterq-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use rasterq::RasterQueryManager;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Application state shared across handlers.
pub struct AppState {
    /// Query manager over the raster catalog built at startup.
    pub manager: RasterQueryManager,
}

/// OpenAPI documentation for the raster query service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Raster Query Service",
        version = "0.1.0",
        description = "REST API for pixel values and statistics of a directory of GeoTIFF rasters.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::query_pixel,
        handlers::get_image_stats,
        handlers::list_images,
        handlers::health_check,
    ),
    components(
        schemas(
            handlers::PixelResponse,
            handlers::StatsResponse,
            handlers::BoundingBoxResponse,
            handlers::ImageSummary,
            handlers::ImagesResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
        )
    ),
    tags(
        (name = "images", description = "Raster query endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the API router (without the Swagger UI) over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/images", get(handlers::list_images))
        .route("/images/:image_name/query", get(handlers::query_pixel))
        .route("/images/:image_name/stats", get(handlers::get_image_stats))
        .route("/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    BoundingBoxResponse, ErrorResponse, HealthResponse, ImageSummary, ImagesResponse, PixelQuery,
    PixelResponse, StatsResponse,
};
