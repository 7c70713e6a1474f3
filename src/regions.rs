//! # Regions Module
//!
//! The closed set of AWS regions the pricing endpoint publishes EC2 offers
//! for, keyed by region code.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Region code, always one of the keys of [`REGIONS`]
pub type RegionCode = &'static str;

const REGION_TABLE: &[(&str, &str)] = &[
    ("af-south-1", "Africa (Cape Town)"),
    ("ap-east-1", "Asia Pacific (Hong Kong)"),
    ("ap-northeast-1", "Asia Pacific (Tokyo)"),
    ("ap-northeast-2", "Asia Pacific (Seoul)"),
    ("ap-northeast-3", "Asia Pacific (Osaka)"),
    ("ap-south-1", "Asia Pacific (Mumbai)"),
    ("ap-south-2", "Asia Pacific (Hyderabad)"),
    ("ap-southeast-1", "Asia Pacific (Singapore)"),
    ("ap-southeast-2", "Asia Pacific (Sydney)"),
    ("ap-southeast-3", "Asia Pacific (Jakarta)"),
    ("ap-southeast-4", "Asia Pacific (Melbourne)"),
    ("ca-central-1", "Canada (Central)"),
    ("ca-west-1", "Canada West (Calgary)"),
    ("cn-north-1", "China (Beijing)"),
    ("cn-northwest-1", "China (Ningxia)"),
    ("eu-central-1", "Europe (Frankfurt)"),
    ("eu-central-2", "Europe (Zurich)"),
    ("eu-north-1", "Europe (Stockholm)"),
    ("eu-south-1", "Europe (Milan)"),
    ("eu-south-2", "Europe (Spain)"),
    ("eu-west-1", "Europe (Ireland)"),
    ("eu-west-2", "Europe (London)"),
    ("eu-west-3", "Europe (Paris)"),
    ("il-central-1", "Israel (Tel Aviv)"),
    ("me-central-1", "Middle East (UAE)"),
    ("me-south-1", "Middle East (Bahrain)"),
    ("sa-east-1", "South America (São Paulo)"),
    ("us-east-1", "US East (N. Virginia)"),
    ("us-east-2", "US East (Ohio)"),
    ("us-gov-east-1", "AWS GovCloud (US-East)"),
    ("us-gov-west-1", "AWS GovCloud (US-West)"),
    ("us-west-1", "US West (N. California)"),
    ("us-west-2", "US West (Oregon)"),
];

/// Region code → display name. Built once, never mutated.
pub static REGIONS: Lazy<BTreeMap<RegionCode, &'static str>> =
    Lazy::new(|| REGION_TABLE.iter().copied().collect());

/// All known region codes in lexicographic order
pub fn region_codes() -> impl Iterator<Item = RegionCode> {
    REGIONS.keys().copied()
}

pub fn display_name(code: &str) -> Option<&'static str> {
    REGIONS.get(code).copied()
}

/// Canonical `'static` code for a region string, if it is a known region
pub fn lookup(code: &str) -> Option<RegionCode> {
    REGIONS.get_key_value(code).map(|(k, _)| *k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_no_duplicate_codes() {
        assert_eq!(REGIONS.len(), REGION_TABLE.len());
    }

    #[test]
    fn test_lookup_and_display_name() {
        assert_eq!(lookup("us-east-1"), Some("us-east-1"));
        assert_eq!(display_name("eu-west-1"), Some("Europe (Ireland)"));
        assert_eq!(lookup("moon-base-1"), None);
        assert_eq!(display_name("US-EAST-1"), None);
    }

    #[test]
    fn test_codes_are_sorted() {
        let codes: Vec<_> = region_codes().collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
        assert!(codes.contains(&"us-gov-west-1"));
    }
}
