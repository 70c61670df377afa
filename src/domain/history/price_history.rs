//! Ordered observation series

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::types::PriceObservation;

/// Observations sorted ascending by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory {
    records: Vec<PriceObservation>,
}

/// Lowest recorded price for one (site, variant)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowestPrice {
    pub site: String,
    pub variant: String,
    pub price: f64,
    pub timestamp: chrono::NaiveDateTime,
    pub url: String,
}

impl PriceHistory {
    pub fn new(mut records: Vec<PriceObservation>) -> Self {
        sort_by_timestamp(&mut records);
        Self { records }
    }

    pub fn records(&self) -> &[PriceObservation] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PriceObservation> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append and re-sort, so task completion order never leaks into storage
    pub fn extend(&mut self, observations: impl IntoIterator<Item = PriceObservation>) {
        self.records.extend(observations);
        sort_by_timestamp(&mut self.records);
    }

    /// Lowest non-null price per (site, variant), optionally filtered.
    ///
    /// Ties keep the earliest observation.
    pub fn lowest(&self, site: Option<&str>, variant: Option<&str>) -> Vec<LowestPrice> {
        let mut lowest: BTreeMap<(String, String), LowestPrice> = BTreeMap::new();

        let matching = self.records.iter().filter(|r| {
            site.map_or(true, |s| r.site.eq_ignore_ascii_case(s))
                && variant.map_or(true, |v| r.variant.eq_ignore_ascii_case(v))
        });

        for record in matching {
            let Some(price) = record.price else { continue };
            let key = (record.site.clone(), record.variant.clone());
            let replace = lowest.get(&key).map_or(true, |current| price < current.price);
            if replace {
                lowest.insert(
                    key,
                    LowestPrice {
                        site: record.site.clone(),
                        variant: record.variant.clone(),
                        price,
                        timestamp: record.timestamp,
                        url: record.url.clone(),
                    },
                );
            }
        }

        lowest.into_values().collect()
    }

    /// Most recent observation for a (site, variant), if any
    pub fn latest(&self, site: &str, variant: &str) -> Option<&PriceObservation> {
        self.records
            .iter()
            .rev()
            .find(|r| r.site == site && r.variant == variant)
    }

    /// Most recent observation of every (site, variant), ordered by key
    pub fn latest_per_target(&self) -> Vec<&PriceObservation> {
        let mut latest: BTreeMap<(&str, &str), &PriceObservation> = BTreeMap::new();
        for record in &self.records {
            latest.insert((record.site.as_str(), record.variant.as_str()), record);
        }
        latest.into_values().collect()
    }
}

pub(super) fn sort_by_timestamp(records: &mut [PriceObservation]) {
    records.sort_by_key(|r| r.timestamp);
}
