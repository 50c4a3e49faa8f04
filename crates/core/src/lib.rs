//! Core types and configuration for the volume profile engine.
//!
//! This crate provides shared types used across all other crates:
//! - Bar and histogram types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ProfileConfig};
pub use error::{Error, ErrorKind, Result};
pub use types::*;
