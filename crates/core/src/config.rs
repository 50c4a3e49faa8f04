//! Configuration structures for the volume profile engine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Recommended bin count range.
pub const RECOMMENDED_BINS: (usize, usize) = (50, 200);

/// Largest accepted bin count.
pub const MAX_BINS_COUNT: usize = 1_000_000;

/// Recommended value-area fraction range.
pub const RECOMMENDED_VA_FRACTION: (f64, f64) = (0.50, 0.90);

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Volume profile configuration.
    pub profile: ProfileConfig,
}

impl Config {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.profile.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Volume profile parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Number of price boundaries (buckets = bins_count - 1).
    pub bins_count: usize,
    /// Target Value Area coverage (e.g., 0.70 for 70%).
    pub va_fraction: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            bins_count: 80,
            va_fraction: 0.70,
        }
    }
}

impl ProfileConfig {
    /// Create a profile configuration.
    pub fn new(bins_count: usize, va_fraction: f64) -> Self {
        Self {
            bins_count,
            va_fraction,
        }
    }

    /// Check hard limits. Values outside the recommended ranges only warn.
    pub fn validate(&self) -> Result<()> {
        if self.bins_count < 2 || self.bins_count > MAX_BINS_COUNT {
            return Err(Error::invalid_input(format!(
                "bins_count must be in 2..={MAX_BINS_COUNT}, got {}",
                self.bins_count
            )));
        }
        if !(self.va_fraction > 0.0 && self.va_fraction < 1.0) {
            return Err(Error::invalid_input(format!(
                "va_fraction must be in (0, 1), got {}",
                self.va_fraction
            )));
        }

        let (min_bins, max_bins) = RECOMMENDED_BINS;
        if self.bins_count < min_bins || self.bins_count > max_bins {
            warn!(
                bins_count = self.bins_count,
                "bins_count outside recommended range {min_bins}-{max_bins}"
            );
        }
        let (min_va, max_va) = RECOMMENDED_VA_FRACTION;
        if self.va_fraction < min_va || self.va_fraction > max_va {
            warn!(
                va_fraction = self.va_fraction,
                "va_fraction outside recommended range {min_va}-{max_va}"
            );
        }
        Ok(())
    }
}
