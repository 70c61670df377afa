//! Pricewatch - multi-site price tracker
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use application::{PriceTrackingService, RunReport, ScrapeOrchestrator, TargetEvaluator};
pub use domain::coupon::CouponResolver;
pub use domain::history::{HistoryCompactor, PriceHistory};
pub use domain::price::parse_price;
pub use shared::types::{PriceObservation, ScrapeTarget};
