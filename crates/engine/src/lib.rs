//! Volume profile computation.
//!
//! This crate handles:
//! - Price bin construction over the bar set's full range
//! - Volume-at-price aggregation by close
//! - Point of Control and Value Area (VAH, VAL)

pub mod bins;
pub mod histogram;
pub mod value_area;
pub mod engine;

pub use bins::build_price_bins;
pub use histogram::{aggregate, assign_and_aggregate, locate_bucket, Aggregation};
pub use value_area::{compute_poc, compute_value_area, ValueAreaBounds};
pub use engine::{compute_profile, summarize, VolumeProfileEngine};
