//! Volume-at-price histogram.
//!
//! Assigns each bar's volume to the bucket containing its close.

use tracing::debug;
use vprofile_core::{Bar, PriceBins, VolumeBin};

/// Histogram plus the number of bars that could not be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// One bucket per bin interval, ascending by price.
    pub volume_bins: Vec<VolumeBin>,
    /// Bars whose close fell outside `[min, max]`.
    pub dropped_bars: usize,
}

impl Aggregation {
    /// Sum of bucket volumes.
    pub fn total_volume(&self) -> f64 {
        self.volume_bins.iter().map(|b| b.volume).sum()
    }
}

/// Find the bucket index for `price`.
///
/// Buckets are half-open `[b[i], b[i+1])` except the last, which also takes
/// `price == max`. Returns `None` outside `[min, max]` (including NaN).
pub fn locate_bucket(bins: &PriceBins, price: f64) -> Option<usize> {
    let (min, max) = (bins.min(), bins.max());
    if !(price >= min && price <= max) {
        return None;
    }

    let last = bins.bucket_count() - 1;
    if price == max {
        return Some(last);
    }

    // Direct index from the nominal width, then nudge against the real
    // boundaries to absorb rounding.
    let boundaries = bins.boundaries();
    let mut idx = (((price - min) / bins.width()) as usize).min(last);
    while idx > 0 && price < boundaries[idx] {
        idx -= 1;
    }
    while idx < last && price >= boundaries[idx + 1] {
        idx += 1;
    }
    Some(idx)
}

/// Aggregate bar volume by close price.
///
/// Zero-volume buckets are kept so indices line up with `bins`.
pub fn aggregate(bars: &[Bar], bins: &PriceBins) -> Aggregation {
    let mut volume_bins: Vec<VolumeBin> = (0..bins.bucket_count())
        .filter_map(|i| bins.midpoint(i))
        .map(|price| VolumeBin { price, volume: 0.0 })
        .collect();

    let mut dropped_bars = 0;
    for bar in bars {
        match locate_bucket(bins, bar.close) {
            Some(idx) => volume_bins[idx].volume += bar.volume,
            None => {
                dropped_bars += 1;
                debug!(
                    ts_ms = bar.ts_ms,
                    close = bar.close,
                    min = bins.min(),
                    max = bins.max(),
                    "dropping bar with close outside price bins"
                );
            }
        }
    }

    Aggregation {
        volume_bins,
        dropped_bars,
    }
}

/// Aggregate bar volume by close price, returning only the buckets.
pub fn assign_and_aggregate(bars: &[Bar], bins: &PriceBins) -> Vec<VolumeBin> {
    aggregate(bars, bins).volume_bins
}
