//! Value Area computation (POC, VAH, VAL).
//!
//! Computes Point of Control and Value Area boundaries from a volume histogram.

use vprofile_core::{Error, Result, VolumeBin};

/// Value Area expressed as an inclusive bucket range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueAreaBounds {
    /// Lowest included bucket index.
    pub low_index: usize,
    /// Highest included bucket index.
    pub high_index: usize,
    /// Value Area Low (midpoint of `low_index`).
    pub val: f64,
    /// Value Area High (midpoint of `high_index`).
    pub vah: f64,
    /// Volume inside the range.
    pub volume: f64,
    /// `volume / total_volume`.
    pub coverage: f64,
    /// False when expansion ran out of non-empty neighbours first.
    pub reached_target: bool,
}

/// Reject fractions outside the open interval (0, 1).
pub(crate) fn check_va_fraction(va_fraction: f64) -> Result<()> {
    if va_fraction > 0.0 && va_fraction < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "va_fraction must be in (0, 1), got {va_fraction}"
        )))
    }
}

/// Find the Point of Control.
///
/// Returns the index and midpoint of the first bucket holding the maximum
/// volume, so ties resolve toward the lower price.
pub fn compute_poc(volume_bins: &[VolumeBin]) -> Result<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, bin) in volume_bins.iter().enumerate() {
        match best {
            Some((_, max)) if bin.volume <= max => {}
            _ => best = Some((i, bin.volume)),
        }
    }

    match best {
        None => Err(Error::empty_profile("no buckets")),
        Some((_, max)) if max <= 0.0 => Err(Error::empty_profile(format!(
            "all {} buckets have zero volume",
            volume_bins.len()
        ))),
        Some((idx, _)) => Ok((idx, volume_bins[idx].price)),
    }
}

/// Grow the Value Area outward from the POC.
///
/// Each step takes whichever neighbour holds more volume, the upper one on
/// ties. Expansion stops at the target, or when no neighbour has volume left;
/// the latter is reported through `reached_target`, not as an error.
pub fn compute_value_area(
    volume_bins: &[VolumeBin],
    poc_index: usize,
    va_fraction: f64,
) -> Result<ValueAreaBounds> {
    check_va_fraction(va_fraction)?;
    if poc_index >= volume_bins.len() {
        return Err(Error::invalid_input(format!(
            "poc_index {poc_index} out of range for {} buckets",
            volume_bins.len()
        )));
    }

    let total_volume: f64 = volume_bins.iter().map(|b| b.volume).sum();
    if total_volume <= 0.0 {
        return Err(Error::empty_profile("total volume is zero"));
    }

    let target_volume = total_volume * va_fraction;
    let mut accumulated = volume_bins[poc_index].volume;
    let mut low = poc_index;
    let mut high = poc_index;

    while accumulated < target_volume {
        let vol_up = volume_bins.get(high + 1).map_or(0.0, |b| b.volume);
        let vol_down = if low > 0 { volume_bins[low - 1].volume } else { 0.0 };

        // Absent neighbours read as zero, so this also covers both edges.
        if vol_up <= 0.0 && vol_down <= 0.0 {
            break;
        }

        if vol_up >= vol_down {
            high += 1;
            accumulated += vol_up;
        } else {
            low -= 1;
            accumulated += vol_down;
        }
    }

    Ok(ValueAreaBounds {
        low_index: low,
        high_index: high,
        val: volume_bins[low].price,
        vah: volume_bins[high].price,
        volume: accumulated,
        coverage: accumulated / total_volume,
        reached_target: accumulated >= target_volume,
    })
}
