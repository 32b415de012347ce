//! `toolkart-search` — debounced, page-accumulating product search.
//!
//! Typing re-queries the catalog after a 500 ms quiet period (the very first
//! non-empty query fires immediately so the screen doesn't feel dead), pages
//! accumulate as the user scrolls, and a generation counter makes sure a
//! late response for an abandoned query can never clobber newer results.

pub mod controller;
pub mod history;

pub use controller::{SearchController, SearchFilters};
pub use history::{HotKeyword, RecentSearch, SearchHistory};
