//! Infrastructure layer - browser, alert delivery and storage adapters

pub mod alerts;
pub mod browser;
pub mod storage;
