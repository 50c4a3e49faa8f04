//! Volume profile engine.
//!
//! Combines binning, aggregation, POC and Value Area into one computation.

use tracing::debug;
use vprofile_core::{
    Bar, Config, Error, ProfileConfig, ProfileResult, ProfileSummary, Result, TimestampMs,
};

use crate::{
    bins::build_price_bins,
    histogram::aggregate,
    value_area::{check_va_fraction, compute_poc, compute_value_area},
};

/// Earliest and latest timestamp in `bars`.
fn time_span(bars: &[Bar]) -> (TimestampMs, TimestampMs) {
    bars.iter().fold((TimestampMs::MAX, TimestampMs::MIN), |(lo, hi), b| {
        (lo.min(b.ts_ms), hi.max(b.ts_ms))
    })
}

/// Compute the full volume profile for a bar set.
///
/// Pure: the same bars and parameters always give the same result.
pub fn compute_profile(bars: &[Bar], bins_count: usize, va_fraction: f64) -> Result<ProfileResult> {
    check_va_fraction(va_fraction)?;

    let bins = build_price_bins(bars, bins_count)?;
    let aggregation = aggregate(bars, &bins);
    let total_volume = aggregation.total_volume();
    let (poc_index, poc) = compute_poc(&aggregation.volume_bins)?;
    let va = compute_value_area(&aggregation.volume_bins, poc_index, va_fraction)?;

    debug!(
        bars = bars.len(),
        buckets = bins.bucket_count(),
        dropped = aggregation.dropped_bars,
        poc,
        val = va.val,
        vah = va.vah,
        coverage = va.coverage,
        reached_target = va.reached_target,
        "computed volume profile"
    );

    Ok(ProfileResult {
        bins,
        volume_bins: aggregation.volume_bins,
        poc_index,
        poc,
        va_low_index: va.low_index,
        va_high_index: va.high_index,
        vah: va.vah,
        val: va.val,
        total_volume,
        value_area_volume: va.volume,
        coverage: va.coverage,
        reached_target: va.reached_target,
        dropped_bars: aggregation.dropped_bars,
        time_span: time_span(bars),
    })
}

/// Summarize a profile against the last bar's close.
///
/// Returns `None` for an empty bar set.
pub fn summarize(bars: &[Bar], result: &ProfileResult) -> Option<ProfileSummary> {
    bars.last().map(|bar| result.summary(bar.close))
}

/// Volume profile engine bound to one set of parameters.
#[derive(Debug, Clone, Default)]
pub struct VolumeProfileEngine {
    config: ProfileConfig,
}

impl VolumeProfileEngine {
    /// Create a new engine from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_profile_config(config.profile.clone())
    }

    /// Create an engine from explicit parameters.
    pub fn with_params(bins_count: usize, va_fraction: f64) -> Result<Self> {
        Self::from_profile_config(ProfileConfig::new(bins_count, va_fraction))
    }

    fn from_profile_config(config: ProfileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Parameters in use.
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Compute the profile for `bars`.
    pub fn compute(&self, bars: &[Bar]) -> Result<ProfileResult> {
        compute_profile(bars, self.config.bins_count, self.config.va_fraction)
    }

    /// Compute the profile and its summary against the last close.
    pub fn compute_with_summary(&self, bars: &[Bar]) -> Result<(ProfileResult, ProfileSummary)> {
        let result = self.compute(bars)?;
        let summary = summarize(bars, &result)
            .ok_or_else(|| Error::invalid_input("no bars to summarize"))?;
        Ok((result, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vprofile_core::{BinTier, PricePosition};

    fn flat_bar(ts_ms: i64, close: f64, volume: f64) -> Bar {
        Bar::new(ts_ms, close, close, close, close, volume)
    }

    /// Deterministic pseudo-random walk, no RNG crate needed.
    fn generated_bars(n: usize, seed: u64) -> Vec<Bar> {
        let mut state = seed;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };

        let mut price = 100.0;
        (0..n)
            .map(|i| {
                let open = price;
                let close = (open + (next() - 0.5) * 2.0).max(1.0);
                let high = open.max(close) + next();
                let low = (open.min(close) - next()).max(0.5);
                let volume = (next() * 1000.0).round();
                price = close;
                Bar::new(i as i64 * 60_000, open, high, low, close, volume)
            })
            .collect()
    }

    #[test]
    fn test_three_bar_scenario() {
        let bars = vec![
            flat_bar(0, 10.0, 5.0),
            flat_bar(60_000, 10.0, 5.0),
            flat_bar(120_000, 20.0, 10.0),
        ];

        let result = compute_profile(&bars, 3, 0.70).unwrap();

        assert_eq!(result.bins.boundaries(), &[10.0, 15.0, 20.0]);
        let volumes: Vec<f64> = result.volume_bins.iter().map(|b| b.volume).collect();
        assert_eq!(volumes, vec![10.0, 10.0]);
        assert_eq!(result.poc_index, 0);
        assert_relative_eq!(result.poc, 12.5);
        assert_eq!((result.va_low_index, result.va_high_index), (0, 1));
        assert_relative_eq!(result.val, 12.5);
        assert_relative_eq!(result.vah, 17.5);
        assert_eq!(result.time_span, (0, 120_000));
    }

    #[test]
    fn test_two_bins_single_bucket() {
        let bars = vec![
            Bar::new(0, 10.0, 12.0, 9.0, 11.0, 4.0),
            Bar::new(1, 11.0, 14.0, 10.0, 14.0, 6.0),
        ];

        let result = compute_profile(&bars, 2, 0.70).unwrap();

        assert_eq!(result.volume_bins.len(), 1);
        assert_relative_eq!(result.volume_bins[0].volume, 10.0);
        assert_relative_eq!(result.poc, 11.5);
        assert_eq!(result.poc_index, 0);
        assert_eq!((result.va_low_index, result.va_high_index), (0, 0));
        assert_eq!(result.val, result.vah);
    }

    #[test]
    fn test_single_zero_volume_bar() {
        let bars = vec![Bar::new(0, 10.0, 11.0, 9.0, 10.0, 0.0)];
        let err = compute_profile(&bars, 10, 0.70).unwrap_err();
        assert!(matches!(err, Error::EmptyProfile(_)));
    }

    #[test]
    fn test_invalid_inputs() {
        let bars = generated_bars(10, 1);
        assert!(compute_profile(&[], 10, 0.7).unwrap_err().is_invalid_input());
        assert!(compute_profile(&bars, 1, 0.7).unwrap_err().is_invalid_input());
        assert!(compute_profile(&bars, 10, 0.0).unwrap_err().is_invalid_input());
        assert!(compute_profile(&bars, 10, 1.0).unwrap_err().is_invalid_input());
        let flat = vec![flat_bar(0, 5.0, 1.0)];
        assert!(compute_profile(&flat, 10, 0.7).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_concentrated_extreme_bucket() {
        // All volume closes at the session high; the rest of the range is empty
        let mut bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(i, 10.0, 11.0, 10.0, 10.5, 0.0))
            .collect();
        bars.push(Bar::new(5, 19.0, 20.0, 18.0, 20.0, 500.0));

        let result = compute_profile(&bars, 11, 0.99).unwrap();

        assert_eq!(result.poc_index, result.volume_bins.len() - 1);
        assert_eq!(result.va_low_index, result.poc_index);
        assert_eq!(result.va_high_index, result.poc_index);
        assert_relative_eq!(result.coverage, 1.0);
    }

    #[test]
    fn test_halted_expansion_is_not_an_error() {
        let bars = vec![
            Bar::new(0, 10.0, 10.0, 10.0, 10.0, 50.0),
            Bar::new(1, 20.0, 20.0, 20.0, 20.0, 50.0),
        ];

        let result = compute_profile(&bars, 11, 0.99).unwrap();

        assert!(!result.reached_target);
        assert_relative_eq!(result.coverage, 0.5);
        assert_eq!(result.va_low_index, result.poc_index);
    }

    #[test]
    fn test_properties_on_generated_bars() {
        for seed in 1..=20u64 {
            let bars = generated_bars(300, seed);
            let input_volume: f64 = bars.iter().map(|b| b.volume).sum();

            for &(bins_count, va_fraction) in &[(2, 0.7), (50, 0.5), (80, 0.7), (200, 0.9)] {
                let result = compute_profile(&bars, bins_count, va_fraction).unwrap();

                assert_eq!(result.dropped_bars, 0);
                assert_eq!(result.volume_bins.len(), bins_count - 1);
                assert_relative_eq!(result.total_volume, input_volume, max_relative = 1e-12);
                assert!(result.va_low_index <= result.poc_index);
                assert!(result.poc_index <= result.va_high_index);
                assert!(result.val <= result.poc && result.poc <= result.vah);

                let max_volume = result
                    .volume_bins
                    .iter()
                    .map(|b| b.volume)
                    .fold(f64::NEG_INFINITY, f64::max);
                assert_eq!(result.volume_bins[result.poc_index].volume, max_volume);
                assert!(result.volume_bins[..result.poc_index]
                    .iter()
                    .all(|b| b.volume < max_volume));

                let in_range: f64 = result.volume_bins
                    [result.va_low_index..=result.va_high_index]
                    .iter()
                    .map(|b| b.volume)
                    .sum();
                assert_relative_eq!(in_range, result.value_area_volume, max_relative = 1e-9);
                if result.reached_target {
                    assert!(result.value_area_volume >= va_fraction * result.total_volume);
                } else {
                    let below = result.va_low_index.checked_sub(1).map(|i| result.volume_bins[i].volume);
                    let above = result.volume_bins.get(result.va_high_index + 1).map(|b| b.volume);
                    assert!(below.unwrap_or(0.0) == 0.0 && above.unwrap_or(0.0) == 0.0);
                }

                assert!(result.bins.boundaries().windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let bars = generated_bars(500, 42);
        let a = compute_profile(&bars, 120, 0.7).unwrap();
        let b = compute_profile(&bars, 120, 0.7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.poc.to_bits(), b.poc.to_bits());
        assert_eq!(a.total_volume.to_bits(), b.total_volume.to_bits());
    }

    #[test]
    fn test_engine_from_config() {
        let engine = VolumeProfileEngine::new(&Config::default()).unwrap();
        assert_eq!(engine.config().bins_count, 80);

        let bars = generated_bars(200, 7);
        let (result, summary) = engine.compute_with_summary(&bars).unwrap();

        assert_eq!(result, compute_profile(&bars, 80, 0.70).unwrap());
        assert_eq!(Some(summary.last_close), bars.last().map(|b| b.close));
        assert_eq!(summarize(&bars, &result), Some(summary));
        assert_eq!(result.tiers().iter().filter(|t| **t == BinTier::Poc).count(), 1);
    }

    #[test]
    fn test_engine_rejects_bad_params_as_invalid_input() {
        let bars = generated_bars(20, 3);
        for &(bins_count, va_fraction) in &[(1, 0.7), (80, 1.2), (80, 0.0), (usize::MAX, 0.7)] {
            let from_engine = VolumeProfileEngine::with_params(bins_count, va_fraction).unwrap_err();
            let from_fn = compute_profile(&bars, bins_count, va_fraction).unwrap_err();
            assert!(from_engine.is_invalid_input(), "{bins_count}, {va_fraction}");
            assert!(from_fn.is_invalid_input(), "{bins_count}, {va_fraction}");
        }

        let mut config = Config::default();
        config.profile.bins_count = 1;
        assert!(VolumeProfileEngine::new(&config).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_default_engine_and_empty_summary() {
        let engine = VolumeProfileEngine::default();
        assert_eq!(engine.config(), &ProfileConfig::default());
        assert!(engine.compute_with_summary(&[]).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_summary_position() {
        let bars = vec![
            flat_bar(0, 10.0, 100.0),
            flat_bar(1, 11.0, 1.0),
            flat_bar(2, 20.0, 1.0),
        ];
        let engine = VolumeProfileEngine::with_params(11, 0.7).unwrap();

        let (result, summary) = engine.compute_with_summary(&bars).unwrap();

        assert_eq!(result.poc_index, 0);
        assert_eq!(summary.position, PricePosition::Above);
        assert!(summarize(&[], &result).is_none());
    }
}
