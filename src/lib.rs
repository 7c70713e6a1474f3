//! # EC2 Prices
//!
//! Fetches the AWS bulk pricing catalog for EC2, extracts on-demand Linux
//! prices per instance type, and lays them out as an instance × region
//! table.
//!
//! ## Overview
//!
//! - Region and instance-type selection with shell-style wildcards
//! - Catalog downloads cached on disk with a time-to-live
//! - Exact decimal prices until the output boundary
//! - CSV, HTML, JSON and plain-text table output
//!
//! ## Features
//!
//! - `colors` (default): highlights cheapest/most expensive cells via owo-colors

/// On-disk JSON cache with mtime-based expiry
pub mod cache;

/// Pricing catalog model and the cached HTTP fetcher
pub mod catalog;

/// Command-line argument parsing and configuration
pub mod cli;

/// Pivoted CSV / HTML / JSON / text rendering
pub mod display;

/// Error taxonomy shared by every stage
pub mod error;

/// On-demand price extraction from a catalog
pub mod extract;

/// Region resolution, fetching, extraction and filtering
pub mod pipeline;

/// Static table of known regions
pub mod regions;

/// Shell-style wildcard matching
pub mod wildcard;

pub use error::{ErrorKind, PriceError};
pub use pipeline::{PipelineOptions, PriceEntry, PriceRow};
