//! # Extract Module
//!
//! Joins the catalog's `products` against `terms.OnDemand` to get one
//! on-demand hourly price per instance type.
//!
//! ## Inclusion rules
//!
//! A product is priced only if it is a shared or dedicated (not `Host`)
//! `Compute Instance` running the requested operating system with no
//! pre-installed software, for regular (`Used`) capacity. Optionally,
//! previous-generation families are dropped as well.
//!
//! Prices stay [`Decimal`] all the way through; converting to floating point
//! is left to the output layer.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::catalog::{PricingCatalog, Product};
use crate::error::{PriceError, Result};

pub const COMPUTE_INSTANCE_FAMILY: &str = "Compute Instance";
pub const DEFAULT_OPERATING_SYSTEM: &str = "Linux";
const PRICE_CURRENCY: &str = "USD";

/// Instance type → on-demand price per hour, ordered by instance type
pub type InstancePrices = BTreeMap<String, Decimal>;

/// Pick a single value out of a map. For the ordered maps used by the
/// catalog model this is the entry with the smallest key, so the choice is
/// stable across runs; callers must not rely on *which* entry it is.
pub fn first_value<K, V>(map: &BTreeMap<K, V>) -> Option<&V> {
    map.values().next()
}

pub fn extract_on_demand_prices(
    catalog: &PricingCatalog,
    operating_system: &str,
    current_generation_only: bool,
) -> Result<InstancePrices> {
    let mut prices = InstancePrices::new();

    for (sku, product) in &catalog.products {
        if !is_on_demand_candidate(sku, product, operating_system, current_generation_only)? {
            continue;
        }

        let terms = catalog
            .terms
            .on_demand
            .get(sku)
            .ok_or_else(|| PriceError::MissingOnDemandTerms { sku: sku.clone() })?;
        let term =
            first_value(terms).ok_or_else(|| PriceError::EmptyOnDemandTerms { sku: sku.clone() })?;
        let dimension = first_value(&term.price_dimensions)
            .ok_or_else(|| PriceError::MissingPriceDimension { sku: sku.clone() })?;

        let raw = dimension
            .price_per_unit
            .get(PRICE_CURRENCY)
            .ok_or_else(|| PriceError::MissingUsdPrice { sku: sku.clone() })?;
        let price = Decimal::from_str(raw.trim()).map_err(|source| PriceError::InvalidPrice {
            sku: sku.clone(),
            value: raw.clone(),
            source,
        })?;

        let instance_type = attribute(sku, product, "instanceType")?;
        // Several SKUs mapping to one instance type: the later SKU wins
        if let Some(previous) = prices.insert(instance_type.to_string(), price) {
            debug!(sku = %sku, instance_type, %previous, %price, "Overwriting duplicate instance type");
        }
    }

    Ok(prices)
}

fn is_on_demand_candidate(
    sku: &str,
    product: &Product,
    operating_system: &str,
    current_generation_only: bool,
) -> Result<bool> {
    if product.product_family.as_deref() != Some(COMPUTE_INSTANCE_FAMILY) {
        return Ok(false);
    }
    if attribute(sku, product, "tenancy")? == "Host" {
        return Ok(false);
    }
    if attribute(sku, product, "operatingSystem")? != operating_system {
        return Ok(false);
    }
    if attribute(sku, product, "preInstalledSw")? != "NA" {
        return Ok(false);
    }
    // Other values: AllocatedCapacityReservation, UnusedCapacityReservation
    if attribute(sku, product, "capacitystatus")? != "Used" {
        return Ok(false);
    }
    if current_generation_only && attribute(sku, product, "currentGeneration")? == "No" {
        return Ok(false);
    }
    Ok(true)
}

fn attribute<'a>(sku: &str, product: &'a Product, name: &'static str) -> Result<&'a str> {
    product
        .attributes
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| PriceError::MissingAttribute {
            sku: sku.to_string(),
            attribute: name,
        })
}
