//! HTTP request handlers for the raster query service.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rasterq::{BoundingBox, PixelValue, RasterDescriptor, RasterError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the pixel endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PixelQuery {
    /// Latitude in decimal degrees (WGS84).
    pub lat: f64,
    /// Longitude in decimal degrees (WGS84).
    pub lon: f64,
}

/// Pixel value at a coordinate.
#[derive(Debug, Serialize, ToSchema)]
pub struct PixelResponse {
    pub image_name: String,
    /// Band 1 value; integral for integer rasters.
    #[schema(value_type = f64)]
    pub pixel_value: PixelValue,
}

/// Raster extent in the raster's native coordinates.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoundingBoxResponse {
    pub min_longitude: f64,
    pub min_latitude: f64,
    pub max_longitude: f64,
    pub max_latitude: f64,
}

impl From<BoundingBox> for BoundingBoxResponse {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            min_longitude: bbox.min_longitude,
            min_latitude: bbox.min_latitude,
            max_longitude: bbox.max_longitude,
            max_latitude: bbox.max_latitude,
        }
    }
}

/// Raster metadata and band 1 statistics.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub image_name: String,
    /// EPSG code, `null` when the raster has no CRS.
    pub image_epsg: Option<u16>,
    #[schema(value_type = f64)]
    pub maximum_pixel_value: PixelValue,
    #[schema(value_type = f64)]
    pub minimum_pixel_value: PixelValue,
    pub mean_pixel_value: f64,
    pub bounding_box: BoundingBoxResponse,
}

impl From<&RasterDescriptor> for StatsResponse {
    fn from(descriptor: &RasterDescriptor) -> Self {
        Self {
            image_name: descriptor.image_name.clone(),
            image_epsg: descriptor.image_epsg,
            maximum_pixel_value: descriptor.maximum_pixel_value,
            minimum_pixel_value: descriptor.minimum_pixel_value,
            mean_pixel_value: descriptor.mean_pixel_value,
            bounding_box: descriptor.bounding_box.into(),
        }
    }
}

/// Catalog entry in the image listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageSummary {
    pub image_name: String,
    pub image_epsg: Option<u16>,
}

/// Image listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImagesResponse {
    /// Number of rasters in the catalog.
    pub count: usize,
    /// Entries sorted by name.
    pub images: Vec<ImageSummary>,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Get the pixel value of a raster at a WGS84 coordinate.
///
/// # Returns
///
/// - `200 OK` with the pixel value on success
/// - `400 Bad Request` if parameters are missing or the point is outside the raster
/// - `404 Not Found` if the raster is not in the catalog
/// - `500 Internal Server Error` on reprojection or read failures
#[utoipa::path(
    get,
    path = "/images/{image_name}/query",
    params(
        ("image_name" = String, Path, description = "Raster name (file name without extension)"),
        PixelQuery
    ),
    responses(
        (status = 200, description = "Pixel value", body = PixelResponse),
        (status = 400, description = "Invalid or out-of-bounds coordinates", body = ErrorResponse),
        (status = 404, description = "Raster not found", body = ErrorResponse),
        (status = 500, description = "Reprojection or read failure", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn query_pixel(
    State(state): State<Arc<AppState>>,
    Path(image_name): Path<String>,
    query: Result<Query<PixelQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::debug!(image_name = %image_name, error = %rejection, "Invalid query parameters");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    if !query.lat.is_finite() || !query.lon.is_finite() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "lat and lon must be finite numbers".to_string(),
            }),
        )
            .into_response();
    }

    tracing::debug!(
        image_name = %image_name,
        lat = query.lat,
        lon = query.lon,
        "Pixel query"
    );

    // The pixel read opens and decodes the file
    let name = image_name.clone();
    let result = tokio::task::spawn_blocking(move || {
        state.manager.query_pixel(&name, query.lon, query.lat)
    })
    .await;

    match result {
        Ok(Ok(pixel_value)) => {
            tracing::info!(
                image_name = %image_name,
                lat = query.lat,
                lon = query.lon,
                pixel_value = %pixel_value,
                "Pixel found"
            );
            (
                StatusCode::OK,
                Json(PixelResponse {
                    image_name,
                    pixel_value,
                }),
            )
                .into_response()
        }
        Ok(Err(e)) => error_response(&image_name, e),
        Err(e) => {
            tracing::error!(image_name = %image_name, error = %e, "Pixel query task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "pixel query task failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Get metadata and band 1 statistics of a raster.
#[utoipa::path(
    get,
    path = "/images/{image_name}/stats",
    params(
        ("image_name" = String, Path, description = "Raster name (file name without extension)")
    ),
    responses(
        (status = 200, description = "Raster statistics", body = StatsResponse),
        (status = 404, description = "Raster not found", body = ErrorResponse)
    ),
    tag = "images"
)]
pub async fn get_image_stats(
    State(state): State<Arc<AppState>>,
    Path(image_name): Path<String>,
) -> Response {
    match state.manager.get_raster_statistics(&image_name) {
        Ok(descriptor) => (StatusCode::OK, Json(StatsResponse::from(descriptor))).into_response(),
        Err(e) => error_response(&image_name, e),
    }
}

/// List the rasters in the catalog.
#[utoipa::path(
    get,
    path = "/images",
    responses(
        (status = 200, description = "Catalog entries", body = ImagesResponse)
    ),
    tag = "images"
)]
pub async fn list_images(State(state): State<Arc<AppState>>) -> Json<ImagesResponse> {
    let images: Vec<ImageSummary> = state
        .manager
        .catalog()
        .descriptors()
        .into_iter()
        .map(|d| ImageSummary {
            image_name: d.image_name.clone(),
            image_epsg: d.image_epsg,
        })
        .collect();

    Json(ImagesResponse {
        count: images.len(),
        images,
    })
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Map a query error to its status code.
fn status_for(e: &RasterError) -> StatusCode {
    match e {
        RasterError::NotFound { .. } => StatusCode::NOT_FOUND,
        e if e.is_bad_request() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create an error response for raster queries.
fn error_response(image_name: &str, e: RasterError) -> Response {
    let status = status_for(&e);

    if status.is_server_error() {
        tracing::error!(image_name = image_name, error = %e, "Raster query failed");
    } else {
        tracing::warn!(image_name = image_name, error = %e, "Raster query rejected");
    }

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}
