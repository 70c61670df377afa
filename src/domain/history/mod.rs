//! History domain - the long-lived, size-bounded observation series

mod price_history;
mod compactor;

pub use price_history::{LowestPrice, PriceHistory};
pub use compactor::{BucketKey, HistoryCompactor, DEFAULT_RETENTION_DAYS};
