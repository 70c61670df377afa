//! Time-bucketed history compaction
//!
//! Inside the retention window every observation is kept. Outside it, each
//! (ISO week, site, variant) bucket collapses to its cheapest observation, so
//! the series stays bounded while the lowest price per period survives.

use chrono::{Datelike, Duration, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::debug;

use super::price_history::{sort_by_timestamp, PriceHistory};
use crate::shared::types::PriceObservation;

pub const DEFAULT_RETENTION_DAYS: i64 = 14;

/// Compaction grouping key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub iso_year: i32,
    pub iso_week: u32,
    pub site: String,
    pub variant: String,
}

impl BucketKey {
    pub fn of(observation: &PriceObservation) -> Self {
        let week = observation.timestamp.iso_week();
        Self {
            iso_year: week.year(),
            iso_week: week.week(),
            site: observation.site.clone(),
            variant: observation.variant.clone(),
        }
    }
}

/// Merges new observations and compacts old ones
#[derive(Debug, Clone)]
pub struct HistoryCompactor {
    retention: Duration,
}

impl Default for HistoryCompactor {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_DAYS)
    }
}

impl HistoryCompactor {
    pub fn new(retention_days: i64) -> Self {
        Self {
            retention: Duration::days(retention_days),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Younger than the retention window relative to `now`.
    /// Timestamps in the future count as recent.
    pub fn is_recent(&self, observation: &PriceObservation, now: NaiveDateTime) -> bool {
        now.signed_duration_since(observation.timestamp) < self.retention
    }

    /// Append `new` to `history`, then compact at `now`
    pub fn merge(
        &self,
        mut history: PriceHistory,
        new: Vec<PriceObservation>,
        now: NaiveDateTime,
    ) -> PriceHistory {
        history.extend(new);
        self.compact(history, now)
    }

    /// Compact a history at reference time `now`.
    ///
    /// Old buckets keep their minimum non-null price, ties going to the
    /// earliest record. A bucket with only null prices keeps its earliest
    /// record. Compacting the output again at the same `now` changes nothing.
    pub fn compact(&self, history: PriceHistory, now: NaiveDateTime) -> PriceHistory {
        let before = history.len();
        let mut records = history.into_records();
        sort_by_timestamp(&mut records);

        let (recent, old): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| self.is_recent(r, now));

        let mut buckets: BTreeMap<BucketKey, PriceObservation> = BTreeMap::new();
        for record in old {
            let key = BucketKey::of(&record);
            let replace = buckets
                .get(&key)
                .map_or(true, |kept| is_cheaper(&record, kept));
            if replace {
                buckets.insert(key, record);
            }
        }

        let mut compacted = recent;
        compacted.extend(buckets.into_values());
        sort_by_timestamp(&mut compacted);

        debug!(
            "Compacted history: {} -> {} records (retention {} days)",
            before,
            compacted.len(),
            self.retention.num_days()
        );

        PriceHistory::new(compacted)
    }
}

/// Strictly cheaper than the kept record; any price beats a null one.
/// Records arrive in timestamp order, so equal prices keep the earliest.
fn is_cheaper(candidate: &PriceObservation, kept: &PriceObservation) -> bool {
    match (candidate.price, kept.price) {
        (Some(c), Some(k)) => c < k,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
