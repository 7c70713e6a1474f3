//! # Error Module
//!
//! A single error type for the fetch → extract → select pipeline. Every
//! failure is fatal to the run; nothing here is retried.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = PriceError> = std::result::Result<T, E>;

/// Coarse failure class, used by the CLI to pick an exit code and by tests
/// to assert on the category rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    DataIntegrity,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("product {sku} is missing attribute `{attribute}`")]
    MissingAttribute { sku: String, attribute: &'static str },

    #[error("price dimension for product {sku} has no USD price")]
    MissingUsdPrice { sku: String },

    #[error("product {sku} has an invalid USD price {value:?}: {source}")]
    InvalidPrice {
        sku: String,
        value: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("compute instance product {sku} has no on-demand terms")]
    MissingOnDemandTerms { sku: String },

    #[error("compute instance product {sku} has an empty on-demand term set")]
    EmptyOnDemandTerms { sku: String },

    #[error("on-demand term for product {sku} has no price dimensions")]
    MissingPriceDimension { sku: String },

    #[error("cache I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PriceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PriceError::Network { .. } | PriceError::Http { .. } => ErrorKind::Network,
            PriceError::Parse { .. }
            | PriceError::MissingAttribute { .. }
            | PriceError::MissingUsdPrice { .. }
            | PriceError::InvalidPrice { .. } => ErrorKind::Parse,
            PriceError::MissingOnDemandTerms { .. }
            | PriceError::EmptyOnDemandTerms { .. }
            | PriceError::MissingPriceDimension { .. } => ErrorKind::DataIntegrity,
            PriceError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PriceError::Io {
            path: path.into(),
            source,
        }
    }
}
