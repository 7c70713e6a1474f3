//! # Catalog Module
//!
//! Typed view of the AWS bulk pricing catalog (`offers/v1.0/aws/...`) and the
//! fetcher that downloads it through the disk cache.
//!
//! Only the parts of the catalog the extractor reads are modelled; unknown
//! fields (`formatVersion`, `publicationDate`, `terms.Reserved`, ...) are
//! skipped by serde. All maps are ordered so that "the first term" and "the
//! first price dimension" are the same on every run.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::{CacheStore, DEFAULT_TTL};
use crate::error::{PriceError, Result};

pub const PRICING_BASE_URL: &str = "https://pricing.us-east-1.amazonaws.com";

/// Offer code for EC2 in the bulk pricing API
pub const EC2_OFFER: &str = "AmazonEC2";

/// Default HTTP timeout; the EC2 catalogs are several hundred megabytes
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const USER_AGENT: &str = concat!("ec2-prices/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize, Debug, Default)]
pub struct PricingCatalog {
    pub products: BTreeMap<String, Product>,
    pub terms: Terms,
}

#[derive(Deserialize, Debug, Default)]
pub struct Product {
    #[serde(rename = "productFamily", default)]
    pub product_family: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Terms {
    /// product id → term id → term
    #[serde(rename = "OnDemand", default)]
    pub on_demand: BTreeMap<String, BTreeMap<String, Term>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Term {
    #[serde(rename = "priceDimensions", default)]
    pub price_dimensions: BTreeMap<String, PriceDimension>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PriceDimension {
    #[serde(default)]
    pub unit: Option<String>,
    /// currency code → decimal string
    #[serde(rename = "pricePerUnit", default)]
    pub price_per_unit: BTreeMap<String, String>,
}

/// Bulk pricing URL for one offer in one region
pub fn price_list_url(base_url: &str, offer: &str, region: &str) -> String {
    format!(
        "{}/offers/v1.0/aws/{offer}/current/{region}/index.json",
        base_url.trim_end_matches('/')
    )
}

/// Cache key for one offer in one region
pub fn cache_key(region: &str, offer: &str) -> String {
    format!("aws-prices-{region}-{offer}")
}

/// Raw HTTP GET, returning the body of a successful response
pub trait HttpGet {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client backed by a shared `ureq` agent
#[derive(Debug, Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpGet for UreqClient {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let network = |e: ureq::Error| PriceError::Network {
            url: url.to_string(),
            source: Box::new(e),
        };

        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(network)
    }
}

/// Anything that can produce a decoded catalog for a region/offer pair
pub trait CatalogSource {
    fn catalog(&self, region: &str, offer: &str) -> Result<PricingCatalog>;
}

/// Downloads catalogs, going through the [`CacheStore`] first.
/// One attempt per call; failures are never retried.
#[derive(Debug, Clone)]
pub struct CatalogFetcher<H = UreqClient> {
    http: H,
    cache: CacheStore,
    ttl: Duration,
    base_url: String,
}

impl CatalogFetcher<UreqClient> {
    pub fn new(cache: CacheStore, timeout: Duration) -> Self {
        Self::with_client(UreqClient::new(timeout), cache)
    }
}

impl<H: HttpGet> CatalogFetcher<H> {
    pub fn with_client(http: H, cache: CacheStore) -> Self {
        Self {
            http,
            cache,
            ttl: DEFAULT_TTL,
            base_url: PRICING_BASE_URL.to_string(),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn fetch(&self, region: &str, offer: &str) -> Result<PricingCatalog> {
        let url = price_list_url(&self.base_url, offer, region);
        let key = cache_key(region, offer);
        let catalog: PricingCatalog = self.cache.get_or_fetch(&key, self.ttl, || {
            info!(%url, "Requesting price list");
            let body = self.http.get(&url)?;
            debug!(%url, bytes = body.len(), "Downloaded price list");
            Ok(body)
        })?;
        debug!(
            region,
            offer,
            products = catalog.products.len(),
            on_demand = catalog.terms.on_demand.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }
}

impl<H: HttpGet> CatalogSource for CatalogFetcher<H> {
    fn catalog(&self, region: &str, offer: &str) -> Result<PricingCatalog> {
        self.fetch(region, offer)
    }
}
