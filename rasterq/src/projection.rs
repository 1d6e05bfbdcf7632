//! Reprojection between WGS84 longitude/latitude and a raster's native CRS.
//!
//! Projection definitions come from the `crs-definitions` EPSG database and are
//! evaluated with `proj4rs`; no system PROJ installation is required.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{RasterError, Result};

/// EPSG code of WGS84 longitude/latitude, the coordinate system of API input.
pub const WGS84: u16 = 4326;

/// PROJ.4 definition of an EPSG code, if the database knows it.
pub fn proj_string(epsg: u16) -> Option<&'static str> {
    crs_definitions::from_code(epsg).map(|def| def.proj4)
}

/// Whether an EPSG code is a geographic (long/lat) CRS.
///
/// Unknown codes in the 4000..5000 range are treated as geographic.
pub fn is_geographic(epsg: u16) -> bool {
    match proj_string(epsg) {
        Some(definition) => definition.contains("+proj=longlat"),
        None => epsg == WGS84 || (4000..5000).contains(&epsg),
    }
}

/// Reproject a WGS84 longitude/latitude into the CRS identified by `epsg`.
///
/// Geographic targets are returned unchanged.
///
/// # Errors
///
/// - [`RasterError::Projection`] if the code is not in the EPSG database or its
///   definition is invalid
/// - [`RasterError::OutOfBounds`] if the point cannot be transformed
pub fn from_wgs84(epsg: u16, lon: f64, lat: f64) -> Result<(f64, f64)> {
    if is_geographic(epsg) {
        return Ok((lon, lat));
    }
    project(WGS84, epsg, lon, lat)
}

/// Reproject native coordinates of `epsg` back to WGS84 longitude/latitude.
///
/// # Errors
///
/// Returns [`RasterError::Projection`] on an unknown code, or
/// [`RasterError::OutOfBounds`] if the point cannot be transformed.
pub fn to_wgs84(epsg: u16, x: f64, y: f64) -> Result<(f64, f64)> {
    if is_geographic(epsg) {
        return Ok((x, y));
    }
    project(epsg, WGS84, x, y)
}

fn load(epsg: u16) -> Result<Proj> {
    let definition = proj_string(epsg).ok_or_else(|| RasterError::Projection {
        epsg,
        message: "code is not in the EPSG database".to_string(),
    })?;
    Proj::from_proj_string(definition).map_err(|e| RasterError::Projection {
        epsg,
        message: format!("invalid definition: {e:?}"),
    })
}

fn project(source: u16, target: u16, x: f64, y: f64) -> Result<(f64, f64)> {
    let source_proj = load(source)?;
    let target_proj = load(target)?;

    // proj4rs works in radians for geographic systems
    let mut point = if is_geographic(source) {
        (x.to_radians(), y.to_radians(), 0.0)
    } else {
        (x, y, 0.0)
    };

    // Points outside the projection domain
    let out_of_range = RasterError::OutOfBounds { x, y };
    if transform(&source_proj, &target_proj, &mut point).is_err() {
        return Err(out_of_range);
    }

    let (out_x, out_y) = if is_geographic(target) {
        (point.0.to_degrees(), point.1.to_degrees())
    } else {
        (point.0, point.1)
    };

    if !out_x.is_finite() || !out_y.is_finite() {
        return Err(out_of_range);
    }
    Ok((out_x, out_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_geographic() {
        assert!(is_geographic(4326));
        assert!(is_geographic(4269));
        assert!(!is_geographic(32633));
        assert!(!is_geographic(3857));
    }

    #[test]
    fn test_wgs84_is_identity() {
        assert_eq!(from_wgs84(4326, 12.5, -33.25).unwrap(), (12.5, -33.25));
        assert_eq!(to_wgs84(4326, 12.5, -33.25).unwrap(), (12.5, -33.25));
    }

    #[test]
    fn test_utm_central_meridian() {
        // 15E is the central meridian of UTM zone 33N
        let (x, y) = from_wgs84(32633, 15.0, 0.0).unwrap();
        assert!((x - 500_000.0).abs() < 1e-3);
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn test_utm_roundtrip() {
        let (x, y) = from_wgs84(32633, 13.4, 52.5).unwrap();
        assert!(x > 300_000.0 && x < 500_000.0);
        assert!(y > 5_800_000.0 && y < 5_830_000.0);

        let (lon, lat) = to_wgs84(32633, x, y).unwrap();
        assert!((lon - 13.4).abs() < 1e-6);
        assert!((lat - 52.5).abs() < 1e-6);
    }

    #[test]
    fn test_web_mercator() {
        let (x, _) = from_wgs84(3857, 90.0, 0.0).unwrap();
        assert!((x - 10_018_754.171394622).abs() < 1e-3);
    }

    #[test]
    fn test_point_outside_projection_domain() {
        for (lon, lat) in [(0.0, 95.0), (0.0, -91.0)] {
            let err = from_wgs84(32633, lon, lat).unwrap_err();
            assert!(matches!(err, RasterError::OutOfBounds { .. }), "{:?}", err);
            assert!(err.is_bad_request());
        }
    }

    #[test]
    fn test_unknown_code() {
        let result = from_wgs84(1, 0.0, 0.0);
        assert!(matches!(result, Err(RasterError::Projection { epsg: 1, .. })));
    }
}
