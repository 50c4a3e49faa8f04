//! Core data types for the volume profile engine.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Price type with ordering support.
pub type Price = OrderedFloat<f64>;

/// Size/quantity type.
pub type Size = f64;

/// Convert a millisecond timestamp to a UTC datetime.
///
/// Returns `None` when the timestamp is outside chrono's representable range.
#[inline]
pub fn ms_to_datetime(ts_ms: TimestampMs) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_ms)
}

/// One OHLCV sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open timestamp (ms).
    pub ts_ms: TimestampMs,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume.
    pub volume: Size,
}

impl Bar {
    /// Create a new bar.
    pub fn new(ts_ms: TimestampMs, open: f64, high: f64, low: f64, close: f64, volume: Size) -> Self {
        Self {
            ts_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar timestamp as a UTC datetime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        ms_to_datetime(self.ts_ms)
    }

    /// High minus low.
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Equal-width price boundaries spanning `[min(low), max(high)]`.
///
/// `n` boundaries describe `n - 1` buckets. Bucket `i` is `[b[i], b[i+1])`,
/// except the last one which is closed on the right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceBins {
    boundaries: Vec<f64>,
}

impl PriceBins {
    /// Wrap a boundary sequence.
    ///
    /// Requires at least two finite, strictly increasing values.
    pub fn new(boundaries: Vec<f64>) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(Error::invalid_input(format!(
                "price bins need at least 2 boundaries, got {}",
                boundaries.len()
            )));
        }
        if let Some(bad) = boundaries.iter().find(|b| !b.is_finite()) {
            return Err(Error::invalid_input(format!("non-finite price boundary {bad}")));
        }
        if let Some(w) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::invalid_input(format!(
                "price boundaries must be strictly increasing, found {} then {}",
                w[0], w[1]
            )));
        }
        Ok(Self { boundaries })
    }

    /// All boundaries, ascending.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Number of buckets (boundaries - 1).
    pub fn bucket_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Lowest boundary.
    pub fn min(&self) -> f64 {
        self.boundaries[0]
    }

    /// Highest boundary.
    pub fn max(&self) -> f64 {
        self.boundaries[self.boundaries.len() - 1]
    }

    /// Nominal bucket width.
    pub fn width(&self) -> f64 {
        (self.max() - self.min()) / self.bucket_count() as f64
    }

    /// Lower and upper edge of bucket `index`.
    pub fn edges(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.bucket_count() {
            return None;
        }
        Some((self.boundaries[index], self.boundaries[index + 1]))
    }

    /// Midpoint of bucket `index`.
    pub fn midpoint(&self, index: usize) -> Option<f64> {
        self.edges(index).map(|(lo, hi)| (lo + hi) / 2.0)
    }
}

impl TryFrom<Vec<f64>> for PriceBins {
    type Error = Error;

    fn try_from(boundaries: Vec<f64>) -> Result<Self> {
        Self::new(boundaries)
    }
}

impl From<PriceBins> for Vec<f64> {
    fn from(bins: PriceBins) -> Self {
        bins.boundaries
    }
}

/// One histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBin {
    /// Bucket midpoint price.
    pub price: f64,
    /// Aggregated volume of bars closing in the bucket.
    pub volume: Size,
}

/// Classification of a bucket for histogram colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinTier {
    /// The Point of Control bucket.
    Poc,
    /// Inside the Value Area (excluding the POC).
    InsideValueArea,
    /// Outside the Value Area.
    OutsideValueArea,
}

/// Where a price sits relative to the Value Area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricePosition {
    /// Above VAH.
    Above,
    /// Between VAL and VAH, inclusive.
    Inside,
    /// Below VAL.
    Below,
}

/// Headline numbers for a profile and the latest price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Latest close.
    pub last_close: f64,
    /// Point of Control.
    pub poc: f64,
    /// Value Area High.
    pub vah: f64,
    /// Value Area Low.
    pub val: f64,
    /// Latest close relative to the Value Area.
    pub position: PricePosition,
}

/// Computed volume profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    /// Boundaries the histogram was built on.
    pub bins: PriceBins,
    /// Buckets, ascending by midpoint.
    pub volume_bins: Vec<VolumeBin>,
    /// Index of the POC bucket.
    pub poc_index: usize,
    /// POC bucket midpoint.
    pub poc: f64,
    /// Lowest bucket index of the Value Area.
    pub va_low_index: usize,
    /// Highest bucket index of the Value Area.
    pub va_high_index: usize,
    /// Value Area High (midpoint of `va_high_index`).
    pub vah: f64,
    /// Value Area Low (midpoint of `va_low_index`).
    pub val: f64,
    /// Sum of all bucket volumes.
    pub total_volume: Size,
    /// Volume inside `[va_low_index, va_high_index]`.
    pub value_area_volume: Size,
    /// `value_area_volume / total_volume`.
    pub coverage: f64,
    /// False when expansion ran out of neighbours before the target.
    pub reached_target: bool,
    /// Bars whose close fell outside the bins.
    pub dropped_bars: usize,
    /// Earliest and latest bar timestamps.
    pub time_span: (TimestampMs, TimestampMs),
}

impl ProfileResult {
    /// Tier of bucket `index`, or `None` if out of range.
    pub fn tier(&self, index: usize) -> Option<BinTier> {
        if index >= self.volume_bins.len() {
            return None;
        }
        let tier = if index == self.poc_index {
            BinTier::Poc
        } else if (self.va_low_index..=self.va_high_index).contains(&index) {
            BinTier::InsideValueArea
        } else {
            BinTier::OutsideValueArea
        };
        Some(tier)
    }

    /// Tier of every bucket, aligned with `volume_bins`.
    pub fn tiers(&self) -> Vec<BinTier> {
        (0..self.volume_bins.len())
            .filter_map(|i| self.tier(i))
            .collect()
    }

    /// Whether `price` lies within `[val, vah]`.
    pub fn contains_price(&self, price: f64) -> bool {
        price >= self.val && price <= self.vah
    }

    /// Position of `price` relative to the Value Area.
    pub fn position_of(&self, price: f64) -> PricePosition {
        if price > self.vah {
            PricePosition::Above
        } else if price < self.val {
            PricePosition::Below
        } else {
            PricePosition::Inside
        }
    }

    /// Summarize the profile against the latest close.
    pub fn summary(&self, last_close: f64) -> ProfileSummary {
        ProfileSummary {
            last_close,
            poc: self.poc,
            vah: self.vah,
            val: self.val,
            position: self.position_of(last_close),
        }
    }

    /// Start and end of the input window as datetimes.
    pub fn time_span_utc(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((ms_to_datetime(self.time_span.0)?, ms_to_datetime(self.time_span.1)?))
    }
}
