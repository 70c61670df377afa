//! Price domain - turning noisy page text into numbers

mod price_normalizer;
mod price_extractor;

pub use price_normalizer::parse_price;
pub use price_extractor::{find_subtotal, lowest_currency_amount, resolve_base_price};
