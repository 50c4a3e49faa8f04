//! PyO3 bindings for the volume profile engine.
//!
//! Exposes the Rust implementation to the Python dashboard:
//! - Bar and histogram types
//! - Profile computation (POC, VAH, VAL)
//! - Logging setup

use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyIOError, PyValueError};
use pyo3::prelude::*;
use tracing_subscriber::EnvFilter;

use vprofile_core::{
    Bar as RustBar,
    BinTier as RustBinTier,
    Config as RustConfig,
    Error as RustError,
    ErrorKind,
    PricePosition as RustPricePosition,
    ProfileResult as RustProfileResult,
    ProfileSummary as RustProfileSummary,
    VolumeBin as RustVolumeBin,
};
use vprofile_engine::VolumeProfileEngine;

create_exception!(
    volume_profile_core,
    EmptyProfileError,
    PyException,
    "No bucket has any volume."
);

create_exception!(
    volume_profile_core,
    InvalidInputError,
    PyValueError,
    "Bars or parameters cannot produce a profile."
);

fn to_py_err(err: RustError) -> PyErr {
    let msg = err.to_string();
    match err.kind() {
        ErrorKind::EmptyProfile => EmptyProfileError::new_err(msg),
        ErrorKind::InvalidInput => InvalidInputError::new_err(msg),
        ErrorKind::Io => PyIOError::new_err(msg),
        ErrorKind::Config | ErrorKind::Json => PyValueError::new_err(msg),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One OHLCV bar.
#[pyclass]
#[derive(Clone)]
pub struct Bar {
    #[pyo3(get, set)]
    pub ts_ms: i64,
    #[pyo3(get, set)]
    pub open: f64,
    #[pyo3(get, set)]
    pub high: f64,
    #[pyo3(get, set)]
    pub low: f64,
    #[pyo3(get, set)]
    pub close: f64,
    #[pyo3(get, set)]
    pub volume: f64,
}

#[pymethods]
impl Bar {
    #[new]
    fn new(ts_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar { ts_ms, open, high, low, close, volume }
    }

    fn __repr__(&self) -> String {
        format!(
            "Bar(ts_ms={}, o={}, h={}, l={}, c={}, v={})",
            self.ts_ms, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl From<&Bar> for RustBar {
    fn from(b: &Bar) -> Self {
        RustBar::new(b.ts_ms, b.open, b.high, b.low, b.close, b.volume)
    }
}

/// One histogram bucket.
#[pyclass]
#[derive(Clone)]
pub struct VolumeBin {
    #[pyo3(get)]
    pub price: f64,
    #[pyo3(get)]
    pub volume: f64,
}

#[pymethods]
impl VolumeBin {
    fn __repr__(&self) -> String {
        format!("VolumeBin(price={:.4}, volume={})", self.price, self.volume)
    }
}

impl From<&RustVolumeBin> for VolumeBin {
    fn from(b: &RustVolumeBin) -> Self {
        VolumeBin {
            price: b.price,
            volume: b.volume,
        }
    }
}

/// Histogram colouring tier.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, PartialEq)]
pub enum BinTier {
    Poc,
    InsideValueArea,
    OutsideValueArea,
}

impl From<RustBinTier> for BinTier {
    fn from(t: RustBinTier) -> Self {
        match t {
            RustBinTier::Poc => BinTier::Poc,
            RustBinTier::InsideValueArea => BinTier::InsideValueArea,
            RustBinTier::OutsideValueArea => BinTier::OutsideValueArea,
        }
    }
}

/// Latest price relative to the Value Area.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, PartialEq)]
pub enum PricePosition {
    Above,
    Inside,
    Below,
}

impl From<RustPricePosition> for PricePosition {
    fn from(p: RustPricePosition) -> Self {
        match p {
            RustPricePosition::Above => PricePosition::Above,
            RustPricePosition::Inside => PricePosition::Inside,
            RustPricePosition::Below => PricePosition::Below,
        }
    }
}

/// Headline numbers for the metric panel.
#[pyclass]
#[derive(Clone)]
pub struct ProfileSummary {
    #[pyo3(get)]
    pub last_close: f64,
    #[pyo3(get)]
    pub poc: f64,
    #[pyo3(get)]
    pub vah: f64,
    #[pyo3(get)]
    pub val: f64,
    #[pyo3(get)]
    pub position: PricePosition,
}

impl From<RustProfileSummary> for ProfileSummary {
    fn from(s: RustProfileSummary) -> Self {
        ProfileSummary {
            last_close: s.last_close,
            poc: s.poc,
            vah: s.vah,
            val: s.val,
            position: s.position.into(),
        }
    }
}

/// Computed volume profile.
#[pyclass]
#[derive(Clone)]
pub struct ProfileResult {
    inner: RustProfileResult,
}

#[pymethods]
impl ProfileResult {
    #[getter]
    fn boundaries(&self) -> Vec<f64> {
        self.inner.bins.boundaries().to_vec()
    }

    #[getter]
    fn volume_bins(&self) -> Vec<VolumeBin> {
        self.inner.volume_bins.iter().map(VolumeBin::from).collect()
    }

    /// Bucket midpoints, ascending.
    #[getter]
    fn prices(&self) -> Vec<f64> {
        self.inner.volume_bins.iter().map(|b| b.price).collect()
    }

    /// Bucket volumes, aligned with `prices`.
    #[getter]
    fn volumes(&self) -> Vec<f64> {
        self.inner.volume_bins.iter().map(|b| b.volume).collect()
    }

    #[getter]
    fn poc_index(&self) -> usize {
        self.inner.poc_index
    }

    #[getter]
    fn poc(&self) -> f64 {
        self.inner.poc
    }

    #[getter]
    fn va_low_index(&self) -> usize {
        self.inner.va_low_index
    }

    #[getter]
    fn va_high_index(&self) -> usize {
        self.inner.va_high_index
    }

    #[getter]
    fn vah(&self) -> f64 {
        self.inner.vah
    }

    #[getter]
    fn val(&self) -> f64 {
        self.inner.val
    }

    #[getter]
    fn total_volume(&self) -> f64 {
        self.inner.total_volume
    }

    #[getter]
    fn value_area_volume(&self) -> f64 {
        self.inner.value_area_volume
    }

    #[getter]
    fn coverage(&self) -> f64 {
        self.inner.coverage
    }

    #[getter]
    fn reached_target(&self) -> bool {
        self.inner.reached_target
    }

    #[getter]
    fn dropped_bars(&self) -> usize {
        self.inner.dropped_bars
    }

    #[getter]
    fn time_span(&self) -> (i64, i64) {
        self.inner.time_span
    }

    /// Tier of every bucket, aligned with `volume_bins`.
    fn tiers(&self) -> Vec<BinTier> {
        self.inner.tiers().into_iter().map(BinTier::from).collect()
    }

    /// Summarize against a given close.
    fn summary(&self, last_close: f64) -> ProfileSummary {
        self.inner.summary(last_close).into()
    }

    fn __repr__(&self) -> String {
        format!(
            "ProfileResult(poc={:.4}, val={:.4}, vah={:.4}, buckets={}, coverage={:.3})",
            self.inner.poc,
            self.inner.val,
            self.inner.vah,
            self.inner.volume_bins.len(),
            self.inner.coverage
        )
    }
}

impl From<RustProfileResult> for ProfileResult {
    fn from(inner: RustProfileResult) -> Self {
        ProfileResult { inner }
    }
}

// ============================================================================
// Python-exposed Functions and Engine
// ============================================================================

fn bars_to_rust(bars: &[Bar]) -> Vec<RustBar> {
    bars.iter().map(RustBar::from).collect()
}

/// Compute a volume profile from a list of bars.
#[pyfunction]
#[pyo3(signature = (bars, bins_count = 80, va_fraction = 0.70))]
fn compute_profile(bars: Vec<Bar>, bins_count: usize, va_fraction: f64) -> PyResult<ProfileResult> {
    vprofile_engine::compute_profile(&bars_to_rust(&bars), bins_count, va_fraction)
        .map(ProfileResult::from)
        .map_err(to_py_err)
}

/// Compute a volume profile from column arrays (e.g. DataFrame columns).
#[pyfunction]
#[pyo3(signature = (ts_ms, open, high, low, close, volume, bins_count = 80, va_fraction = 0.70))]
#[allow(clippy::too_many_arguments)]
fn compute_profile_arrays(
    ts_ms: Vec<i64>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    bins_count: usize,
    va_fraction: f64,
) -> PyResult<ProfileResult> {
    let n = ts_ms.len();
    let lengths = [open.len(), high.len(), low.len(), close.len(), volume.len()];
    if lengths.iter().any(|&len| len != n) {
        return Err(InvalidInputError::new_err(format!(
            "column lengths differ: ts_ms={n}, open/high/low/close/volume={lengths:?}"
        )));
    }

    let bars: Vec<RustBar> = (0..n)
        .map(|i| RustBar::new(ts_ms[i], open[i], high[i], low[i], close[i], volume[i]))
        .collect();

    vprofile_engine::compute_profile(&bars, bins_count, va_fraction)
        .map(ProfileResult::from)
        .map_err(to_py_err)
}

/// Install a tracing subscriber with the given filter (e.g. "debug").
///
/// Returns False if a subscriber was already installed.
#[pyfunction]
#[pyo3(signature = (filter = "info"))]
fn init_logging(filter: &str) -> PyResult<bool> {
    let env_filter = EnvFilter::try_new(filter)
        .map_err(|e| PyValueError::new_err(format!("invalid log filter {filter:?}: {e}")))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok())
}

/// Volume profile engine with fixed parameters.
#[pyclass]
pub struct PyVolumeProfileEngine {
    inner: VolumeProfileEngine,
}

#[pymethods]
impl PyVolumeProfileEngine {
    #[new]
    #[pyo3(signature = (bins_count = 80, va_fraction = 0.70))]
    fn new(bins_count: usize, va_fraction: f64) -> PyResult<Self> {
        let inner = VolumeProfileEngine::with_params(bins_count, va_fraction).map_err(to_py_err)?;
        Ok(PyVolumeProfileEngine { inner })
    }

    /// Create from a JSON config file.
    #[staticmethod]
    fn from_json_file(path: &str) -> PyResult<Self> {
        let config = RustConfig::from_json_file(path).map_err(to_py_err)?;
        let inner = VolumeProfileEngine::new(&config).map_err(to_py_err)?;
        Ok(PyVolumeProfileEngine { inner })
    }

    #[getter]
    fn bins_count(&self) -> usize {
        self.inner.config().bins_count
    }

    #[getter]
    fn va_fraction(&self) -> f64 {
        self.inner.config().va_fraction
    }

    /// Compute the profile for `bars`.
    fn compute(&self, bars: Vec<Bar>) -> PyResult<ProfileResult> {
        self.inner
            .compute(&bars_to_rust(&bars))
            .map(ProfileResult::from)
            .map_err(to_py_err)
    }

    /// Compute the profile and the summary against the last close.
    fn compute_with_summary(&self, bars: Vec<Bar>) -> PyResult<(ProfileResult, ProfileSummary)> {
        let (result, summary) = self
            .inner
            .compute_with_summary(&bars_to_rust(&bars))
            .map_err(to_py_err)?;
        Ok((result.into(), summary.into()))
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Volume Profile Core - Rust volume profile engine for Python.
#[pymodule]
fn volume_profile_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Bar>()?;
    m.add_class::<VolumeBin>()?;
    m.add_class::<BinTier>()?;
    m.add_class::<PricePosition>()?;
    m.add_class::<ProfileSummary>()?;
    m.add_class::<ProfileResult>()?;

    // Engine
    m.add_class::<PyVolumeProfileEngine>()?;
    m.add_function(wrap_pyfunction!(compute_profile, m)?)?;
    m.add_function(wrap_pyfunction!(compute_profile_arrays, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Errors
    m.add("EmptyProfileError", m.py().get_type_bound::<EmptyProfileError>())?;
    m.add("InvalidInputError", m.py().get_type_bound::<InvalidInputError>())?;

    Ok(())
}
