//! Affine mapping between pixel row/column indices and raster coordinates.
//!
//! Coefficients follow the usual six-term geotransform layout:
//!
//! ```text
//! x = origin_x + col * pixel_width + row * row_rotation
//! y = origin_y + col * col_rotation + row * pixel_height
//! ```
//!
//! For a north-up raster both rotations are zero and `pixel_height` is negative.

use crate::catalog::BoundingBox;

/// Six-coefficient affine transform of a raster grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Transform for an axis-aligned, north-up grid.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height: -pixel_height.abs(),
        }
    }

    /// Build from a GeoTIFF `ModelTiepoint` (I, J, K, X, Y, Z) and `ModelPixelScale` (Sx, Sy, Sz).
    ///
    /// Only the first tiepoint is used. Returns `None` when either array is too short.
    pub fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 {
            return None;
        }

        let (i, j) = (tiepoint[0], tiepoint[1]);
        let (x, y) = (tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);

        Some(Self {
            origin_x: x - i * sx,
            pixel_width: sx,
            row_rotation: 0.0,
            origin_y: y + j * sy,
            col_rotation: 0.0,
            pixel_height: -sy,
        })
    }

    /// Build from a row-major 4x4 GeoTIFF `ModelTransformation` matrix.
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }

        Some(Self {
            origin_x: matrix[3],
            pixel_width: matrix[0],
            row_rotation: matrix[1],
            origin_y: matrix[7],
            col_rotation: matrix[4],
            pixel_height: matrix[5],
        })
    }

    /// Move the origin from a pixel centre to the pixel corner.
    ///
    /// GeoTIFFs flagged `RasterPixelIsPoint` tie coordinates to cell centres;
    /// everything else in this crate assumes corner-anchored cells.
    pub fn shifted_to_corner(self) -> Self {
        Self {
            origin_x: self.origin_x - 0.5 * self.pixel_width - 0.5 * self.row_rotation,
            origin_y: self.origin_y - 0.5 * self.col_rotation - 0.5 * self.pixel_height,
            ..self
        }
    }

    /// Raster coordinates of a (possibly fractional) column/row position.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Whether raster coordinates can be mapped back to pixels.
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det != 0.0 && det.is_finite()
    }

    /// Fractional column/row position of raster coordinates.
    ///
    /// Returns `None` for a degenerate (non-invertible) transform.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !self.is_invertible() {
            return None;
        }
        let det = self.determinant();

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (self.pixel_width * dy - self.col_rotation * dx) / det;

        Some((col, row))
    }

    /// Row/column index of the cell containing the coordinates.
    ///
    /// Indices are floored and may be negative or past the grid edge;
    /// range checking is left to the caller.
    pub fn index(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (col, row) = self.world_to_pixel(x, y)?;
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        Some((row.floor() as i64, col.floor() as i64))
    }

    /// Raster coordinates of the centre of a cell.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Spatial size of one pixel along x and y (always positive).
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.pixel_width.hypot(self.col_rotation),
            self.row_rotation.hypot(self.pixel_height),
        )
    }

    /// Extent of a `width` x `height` grid, normalised so that min <= max.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(w, 0.0),
            self.pixel_to_world(0.0, h),
            self.pixel_to_world(w, h),
        ];

        let mut bbox = BoundingBox::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for (x, y) in corners {
            bbox.min_longitude = bbox.min_longitude.min(x);
            bbox.max_longitude = bbox.max_longitude.max(x);
            bbox.min_latitude = bbox.min_latitude.min(y);
            bbox.max_latitude = bbox.max_latitude.max(y);
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_from_tiepoint_and_scale() {
        let gt =
            GeoTransform::from_tiepoint_and_scale(&[0.0, 0.0, 0.0, -10.0, 60.0, 0.0], &[1.0, 0.5, 0.0])
                .unwrap();
        assert_eq!(gt, GeoTransform::north_up(-10.0, 60.0, 1.0, 0.5));

        // Tiepoint anchored at pixel (2, 4) instead of the corner
        let gt =
            GeoTransform::from_tiepoint_and_scale(&[2.0, 4.0, 0.0, 100.0, 200.0, 0.0], &[10.0, 10.0])
                .unwrap();
        assert!(approx_eq(gt.origin_x, 80.0));
        assert!(approx_eq(gt.origin_y, 240.0));

        assert!(GeoTransform::from_tiepoint_and_scale(&[0.0; 5], &[1.0, 1.0]).is_none());
        assert!(GeoTransform::from_tiepoint_and_scale(&[0.0; 6], &[1.0]).is_none());
    }

    #[test]
    fn test_from_model_transformation() {
        let matrix = [
            2.0, 0.0, 0.0, 500.0, //
            0.0, -2.0, 0.0, 1000.0, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let gt = GeoTransform::from_model_transformation(&matrix).unwrap();
        assert_eq!(gt, GeoTransform::north_up(500.0, 1000.0, 2.0, 2.0));
        assert!(GeoTransform::from_model_transformation(&matrix[..12]).is_none());
    }

    #[test]
    fn test_index_floors_toward_cell() {
        let gt = GeoTransform::north_up(-10.0, 60.0, 1.0, 1.0);

        assert_eq!(gt.index(-10.0, 60.0), Some((0, 0)));
        assert_eq!(gt.index(-9.5, 59.5), Some((0, 0)));
        assert_eq!(gt.index(0.0, 50.0), Some((10, 10)));
        assert_eq!(gt.index(9.999, 40.001), Some((19, 19)));

        // Outside the grid on either side
        assert_eq!(gt.index(-10.5, 60.0), Some((0, -1)));
        assert_eq!(gt.index(10.0, 40.0), Some((20, 20)));
    }

    #[test]
    fn test_index_degenerate_transform() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0, 1.0);
        assert!(!gt.is_invertible());
        assert_eq!(gt.index(1.0, 1.0), None);
        assert!(GeoTransform::north_up(0.0, 0.0, 1.0, 1.0).is_invertible());
    }

    #[test]
    fn test_cell_center_roundtrip() {
        let gt = GeoTransform::north_up(500_000.0, 5_800_000.0, 30.0, 30.0);
        for (row, col) in [(0usize, 0usize), (3, 7), (99, 1)] {
            let (x, y) = gt.cell_center(row, col);
            assert_eq!(gt.index(x, y), Some((row as i64, col as i64)));
        }
    }

    #[test]
    fn test_shifted_to_corner() {
        let gt = GeoTransform::north_up(0.5, 9.5, 1.0, 1.0).shifted_to_corner();
        assert!(approx_eq(gt.origin_x, 0.0));
        assert!(approx_eq(gt.origin_y, 10.0));
    }

    #[test]
    fn test_bounds_north_up() {
        let gt = GeoTransform::north_up(-10.0, 60.0, 1.0, 1.0);
        let bbox = gt.bounds(20, 20);
        assert_eq!(bbox, BoundingBox::new(-10.0, 40.0, 10.0, 60.0));
    }

    #[test]
    fn test_bounds_south_up_is_normalised() {
        // Positive pixel height: row 0 is the southern edge
        let gt = GeoTransform {
            pixel_height: 1.0,
            ..GeoTransform::north_up(-10.0, 40.0, 1.0, 1.0)
        };
        let bbox = gt.bounds(20, 20);
        assert!(bbox.min_latitude <= bbox.max_latitude);
        assert_eq!(bbox, BoundingBox::new(-10.0, 40.0, 10.0, 60.0));
    }

    #[test]
    fn test_rotated_roundtrip() {
        let gt = GeoTransform {
            origin_x: 100.0,
            pixel_width: 2.0,
            row_rotation: 0.5,
            origin_y: 300.0,
            col_rotation: 0.25,
            pixel_height: -2.0,
        };
        let (x, y) = gt.pixel_to_world(3.25, 7.5);
        let (col, row) = gt.world_to_pixel(x, y).unwrap();
        assert!(approx_eq(col, 3.25));
        assert!(approx_eq(row, 7.5));
    }

    #[test]
    fn test_resolution() {
        let gt = GeoTransform::north_up(0.0, 0.0, 30.0, 15.0);
        assert_eq!(gt.resolution(), (30.0, 15.0));
    }
}
