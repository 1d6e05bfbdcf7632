//! Integration tests for the HTTP API.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use rasterq::RasterQueryManager;
use rasterq_service::{router, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Write the 20x20 "basemap" u8 raster over (-10, 40)..(10, 60), EPSG:4326.
///
/// Cell (row, col) holds `row * 10 + col % 10`; the value 0 is no-data.
fn create_basemap(dir: &Path) {
    let data: Vec<u8> = (0..20u8)
        .flat_map(|row| (0..20u8).map(move |col| row * 10 + col % 10))
        .collect();

    let file = BufWriter::new(File::create(dir.join("basemap.tif")).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<Gray8>(20, 20).unwrap();
    let tags = image.encoder();
    tags.write_tag(Tag::from_u16_exhaustive(33550), &[1.0, 1.0, 0.0][..])
        .unwrap();
    tags.write_tag(
        Tag::from_u16_exhaustive(33922),
        &[0.0, 0.0, 0.0, -10.0, 60.0, 0.0][..],
    )
    .unwrap();
    tags.write_tag(
        Tag::from_u16_exhaustive(34735),
        &[1u16, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 4326][..],
    )
    .unwrap();
    tags.write_tag(Tag::from_u16_exhaustive(42113), "0").unwrap();
    image.write_data(&data).unwrap();
}

/// Write a 10x10 float raster in UTM zone 33N (EPSG:32633) with 1 km pixels.
///
/// The grid spans eastings 480..490 km and northings 5790..5800 km; every cell is 7.25.
fn create_utm_raster(dir: &Path) {
    let data = vec![7.25f32; 100];

    let file = BufWriter::new(File::create(dir.join("utm.tif")).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<Gray32Float>(10, 10).unwrap();
    let tags = image.encoder();
    tags.write_tag(Tag::from_u16_exhaustive(33550), &[1000.0, 1000.0, 0.0][..])
        .unwrap();
    tags.write_tag(
        Tag::from_u16_exhaustive(33922),
        &[0.0, 0.0, 0.0, 480_000.0, 5_800_000.0, 0.0][..],
    )
    .unwrap();
    tags.write_tag(
        Tag::from_u16_exhaustive(34735),
        &[1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32633][..],
    )
    .unwrap();
    image.write_data(&data).unwrap();
}

/// Create a test server over the rasters in `temp_dir`.
fn create_test_server(temp_dir: &TempDir) -> TestServer {
    let manager = RasterQueryManager::from_directory(temp_dir.path()).unwrap();
    let state = Arc::new(AppState { manager });
    TestServer::new(router(state)).unwrap()
}

fn basemap_server() -> (TempDir, TestServer) {
    let temp_dir = TempDir::new().unwrap();
    create_basemap(temp_dir.path());
    let server = create_test_server(&temp_dir);
    (temp_dir, server)
}

#[tokio::test]
async fn test_query_endpoint_success() {
    let (_temp_dir, server) = basemap_server();

    // lon 0.5 -> col 10, lat 50.5 -> row 9
    let response = server.get("/images/basemap/query?lat=50.5&lon=0.5").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["image_name"], "basemap");
    assert_eq!(json["pixel_value"], 90);
}

#[tokio::test]
async fn test_query_endpoint_out_of_bounds() {
    let (_temp_dir, server) = basemap_server();

    let response = server.get("/images/basemap/query?lat=50.0&lon=20.0").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let json: Value = response.json();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("outside the bounding box"));
}

#[tokio::test]
async fn test_query_endpoint_edge_outside_grid() {
    let (_temp_dir, server) = basemap_server();

    // Inside the inclusive bounding box, but one column past the grid
    let response = server.get("/images/basemap/query?lat=50.0&lon=10.0").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_endpoint_unknown_image() {
    let (_temp_dir, server) = basemap_server();

    let response = server.get("/images/missing/query?lat=50.0&lon=0.0").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_query_endpoint_missing_params() {
    let (_temp_dir, server) = basemap_server();

    // Missing lat
    let response = server.get("/images/basemap/query?lon=0.5").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Missing lon
    let response = server.get("/images/basemap/query?lat=50.5").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Missing both
    let response = server.get("/images/basemap/query").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    // Not a number
    let response = server.get("/images/basemap/query?lat=north&lon=0.5").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_endpoint_projected_raster() {
    let temp_dir = TempDir::new().unwrap();
    create_utm_raster(temp_dir.path());
    let server = create_test_server(&temp_dir);

    // Roughly (485 km E, 5795 km N) in zone 33N
    let response = server.get("/images/utm/query?lat=52.3&lon=14.78").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["pixel_value"], 7.25);

    // Geographic degrees are far outside the metre bounding box once converted
    let response = server.get("/images/utm/query?lat=40.0&lon=0.0").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_endpoint_projected_raster_invalid_latitude() {
    let temp_dir = TempDir::new().unwrap();
    create_utm_raster(temp_dir.path());
    let server = create_test_server(&temp_dir);

    // Latitudes past the poles cannot be projected into UTM
    let response = server.get("/images/utm/query?lat=95&lon=0").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server.get("/images/utm/query?lat=-91&lon=0").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (_temp_dir, server) = basemap_server();

    let response = server.get("/images/basemap/stats").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["image_name"], "basemap");
    assert_eq!(json["image_epsg"], 4326);
    assert_eq!(json["maximum_pixel_value"], 199);
    // 0 is no-data and never the minimum
    assert_eq!(json["minimum_pixel_value"], 1);
    assert!(json["mean_pixel_value"].is_f64());

    let bbox = &json["bounding_box"];
    assert_eq!(bbox["min_longitude"], -10.0);
    assert_eq!(bbox["min_latitude"], 40.0);
    assert_eq!(bbox["max_longitude"], 10.0);
    assert_eq!(bbox["max_latitude"], 60.0);
}

#[tokio::test]
async fn test_stats_endpoint_unknown_image() {
    let (_temp_dir, server) = basemap_server();

    let response = server.get("/images/missing/stats").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_broken_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    create_basemap(temp_dir.path());
    std::fs::write(temp_dir.path().join("truncated.tif"), b"II*\0\x08\0\0").unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/images").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["count"], 1);
    assert_eq!(json["images"][0]["image_name"], "basemap");

    let response = server.get("/images/truncated/stats").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_images_sorted() {
    let temp_dir = TempDir::new().unwrap();
    create_utm_raster(temp_dir.path());
    create_basemap(temp_dir.path());
    let server = create_test_server(&temp_dir);

    let response = server.get("/images").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["count"], 2);
    assert_eq!(json["images"][0]["image_name"], "basemap");
    assert_eq!(json["images"][0]["image_epsg"], 4326);
    assert_eq!(json["images"][1]["image_name"], "utm");
    assert_eq!(json["images"][1]["image_epsg"], 32633);
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}
