//! # Pipeline Module
//!
//! Region patterns → catalogs → per-region prices → instance-type filter →
//! flat list of [`PriceEntry`] rows.
//!
//! Any failure in any region aborts the whole run; a report with a region
//! silently missing would be misleading.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::thread;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSource, EC2_OFFER};
use crate::error::Result;
use crate::extract::{DEFAULT_OPERATING_SYSTEM, InstancePrices, extract_on_demand_prices};
use crate::regions::{self, RegionCode};
use crate::wildcard;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Region codes or glob patterns; at least one is expected
    pub region_patterns: Vec<String>,
    /// Instance type globs; empty means every instance type
    pub instance_type_patterns: Vec<String>,
    pub operating_system: String,
    pub current_generation_only: bool,
    pub offer: String,
    /// Regions processed concurrently; 0 and 1 both mean sequential
    pub jobs: usize,
}

impl PipelineOptions {
    pub fn new(region_patterns: Vec<String>) -> Self {
        Self {
            region_patterns,
            ..Self::default()
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            region_patterns: Vec::new(),
            instance_type_patterns: Vec::new(),
            operating_system: DEFAULT_OPERATING_SYSTEM.to_string(),
            current_generation_only: true,
            offer: EC2_OFFER.to_string(),
            jobs: 1,
        }
    }
}

/// One on-demand price for one instance type in one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry {
    pub region: RegionCode,
    pub instance: String,
    pub price: Decimal,
}

/// Output-boundary form of [`PriceEntry`]; the only place prices become floats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub region: String,
    pub instance: String,
    pub price: f64,
}

impl From<&PriceEntry> for PriceRow {
    fn from(entry: &PriceEntry) -> Self {
        PriceRow {
            region: entry.region.to_string(),
            instance: entry.instance.clone(),
            price: entry.price.to_f64().unwrap_or(f64::NAN),
        }
    }
}

pub fn to_rows(entries: &[PriceEntry]) -> Vec<PriceRow> {
    entries.iter().map(PriceRow::from).collect()
}

/// Expand region patterns against the known-region table. The result is
/// deduplicated and in table order.
pub fn resolve_regions<S: AsRef<str>>(patterns: &[S]) -> Vec<RegionCode> {
    wildcard::filter(regions::region_codes(), patterns)
        .iter()
        .filter_map(|code| regions::lookup(code))
        .collect()
}

pub fn run<S>(source: &S, options: &PipelineOptions) -> Result<Vec<PriceEntry>>
where
    S: CatalogSource + Sync,
{
    let regions = resolve_regions(&options.region_patterns);
    if regions.is_empty() {
        warn!(patterns = ?options.region_patterns, "No known region matches the given patterns");
        return Ok(Vec::new());
    }
    info!(regions = ?regions, "Resolved regions");

    let per_region = if options.jobs > 1 && regions.len() > 1 {
        prices_parallel(source, &regions, options)?
    } else {
        regions
            .iter()
            .map(|&region| -> Result<_> { Ok((region, region_prices(source, region, options)?)) })
            .collect::<Result<Vec<_>>>()?
    };

    let mut entries = Vec::new();
    for (region, prices) in per_region {
        let before = entries.len();
        for (instance, price) in prices {
            if !options.instance_type_patterns.is_empty()
                && !wildcard::matches_any(&instance, &options.instance_type_patterns)
            {
                continue;
            }
            entries.push(PriceEntry {
                region,
                instance,
                price,
            });
        }
        debug!(region, rows = entries.len() - before, "Selected instance types");
    }
    Ok(entries)
}

fn region_prices<S: CatalogSource>(
    source: &S,
    region: RegionCode,
    options: &PipelineOptions,
) -> Result<InstancePrices> {
    let catalog = source.catalog(region, &options.offer)?;
    let prices = extract_on_demand_prices(
        &catalog,
        &options.operating_system,
        options.current_generation_only,
    )?;
    debug!(region, instance_types = prices.len(), "Extracted on-demand prices");
    Ok(prices)
}

/// Fan regions out over at most `options.jobs` scoped threads. Results keep
/// region order; the first failing region (in that order) is reported.
fn prices_parallel<S>(
    source: &S,
    regions: &[RegionCode],
    options: &PipelineOptions,
) -> Result<Vec<(RegionCode, InstancePrices)>>
where
    S: CatalogSource + Sync,
{
    let chunk_size = regions.len().div_ceil(options.jobs);
    thread::scope(|scope| -> Result<Vec<_>> {
        let handles: Vec<_> = regions
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&region| -> Result<_> {
                            Ok((region, region_prices(source, region, options)?))
                        })
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();

        let mut out = Vec::with_capacity(regions.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk) => out.extend(chunk?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(out)
    })
}
