//! Domain layer - core business logic and entities

pub mod coupon;
pub mod history;
pub mod price;
