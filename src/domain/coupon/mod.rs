//! Coupon domain - promotional code discovery and discount inference

mod coupon_resolver;

pub use coupon_resolver::{
    classify_label, code_value, CouponCandidate, CouponPattern, CouponResolver,
    DiscountKind, DiscountResolution,
};
