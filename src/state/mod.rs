//! State module for tracking crawl progress
//!
//! Every URL the frontier claims moves through [`PageState`]; the frontier
//! keeps the current state of each claimed URL as its visited set.

mod page_state;

pub use page_state::PageState;
