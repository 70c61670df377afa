//! Page fetching boundary.
//!
//! `PageSession` is the shared browsing session; every evaluation opens its
//! own `PageView` from it and closes that view when done.

mod traits;
pub mod chromium;

pub use traits::{PageElement, PageSession, PageView};
pub use chromium::ChromiumSession;
