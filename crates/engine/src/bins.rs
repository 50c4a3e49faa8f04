//! Price bin construction.
//!
//! Spans the full low-to-high range of a bar set with equal-width boundaries.

use ordered_float::OrderedFloat;
use vprofile_core::{config::MAX_BINS_COUNT, Bar, Error, Price, PriceBins, Result};

/// Check that every bar carries usable, positive prices in OHLC order.
fn validate_bar(bar: &Bar) -> Result<()> {
    let prices = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ];
    for (field, value) in prices {
        if !value.is_finite() {
            return Err(Error::invalid_input(format!(
                "bar at ts_ms={} has non-finite {field}: {value}",
                bar.ts_ms
            )));
        }
        if value <= 0.0 {
            return Err(Error::invalid_input(format!(
                "bar at ts_ms={} has non-positive {field}: {value}",
                bar.ts_ms
            )));
        }
    }
    if !bar.volume.is_finite() || bar.volume < 0.0 {
        return Err(Error::invalid_input(format!(
            "bar at ts_ms={} has invalid volume: {}",
            bar.ts_ms, bar.volume
        )));
    }
    if bar.low > bar.open.min(bar.close) || bar.high < bar.open.max(bar.close) {
        return Err(Error::invalid_input(format!(
            "bar at ts_ms={} has open {} / close {} outside low {} .. high {}",
            bar.ts_ms, bar.open, bar.close, bar.low, bar.high
        )));
    }
    Ok(())
}

/// Build `bins_count` linearly spaced boundaries from `min(low)` to `max(high)`.
///
/// The last boundary is exactly `max(high)`, so a close at the session high
/// always has a bucket.
pub fn build_price_bins(bars: &[Bar], bins_count: usize) -> Result<PriceBins> {
    if bins_count < 2 {
        return Err(Error::invalid_input(format!(
            "bins_count must be >= 2, got {bins_count}"
        )));
    }
    if bins_count > MAX_BINS_COUNT {
        return Err(Error::invalid_input(format!(
            "bins_count must be <= {MAX_BINS_COUNT}, got {bins_count}"
        )));
    }
    if bars.is_empty() {
        return Err(Error::invalid_input("no bars to build a profile from"));
    }

    let mut price_min: Price = OrderedFloat(f64::INFINITY);
    let mut price_max: Price = OrderedFloat(f64::NEG_INFINITY);
    for bar in bars {
        validate_bar(bar)?;
        price_min = price_min.min(OrderedFloat(bar.low));
        price_max = price_max.max(OrderedFloat(bar.high));
    }

    let (lo, hi) = (price_min.0, price_max.0);
    if lo == hi {
        return Err(Error::invalid_input(format!(
            "degenerate price range: min low == max high == {lo}"
        )));
    }

    let step = (hi - lo) / (bins_count - 1) as f64;
    let mut boundaries: Vec<f64> = (0..bins_count - 1)
        .map(|i| lo + i as f64 * step)
        .collect();
    boundaries.push(hi);

    PriceBins::new(boundaries)
}
