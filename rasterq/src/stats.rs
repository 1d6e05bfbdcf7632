//! Masked band statistics.

use crate::geotiff::{PixelValue, SampleKind};

/// Minimum, maximum and mean of the valid cells of a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStatistics {
    pub minimum: PixelValue,
    pub maximum: PixelValue,
    pub mean: f64,
    /// Number of cells that took part in the statistics.
    pub valid_count: u64,
}

/// Whether a sample is excluded from statistics.
///
/// NaN cells are always masked; a NaN no-data value therefore needs no special case.
pub fn is_masked(value: f64, nodata: Option<f64>) -> bool {
    value.is_nan() || nodata.is_some_and(|nd| value == nd)
}

/// Compute statistics over `values`, skipping no-data and NaN cells.
///
/// Returns `None` when no cell is valid.
pub fn masked_statistics(
    values: &[f64],
    kind: SampleKind,
    nodata: Option<f64>,
) -> Option<BandStatistics> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0u64;

    for &v in values.iter().filter(|&&v| !is_masked(v, nodata)) {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(BandStatistics {
        minimum: PixelValue::from_sample(kind, min),
        maximum: PixelValue::from_sample(kind, max),
        mean: sum / count as f64,
        valid_count: count,
    })
}
