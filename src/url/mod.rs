//! URL handling module for Site-Audit
//!
//! This module provides base-URL validation, visited-set normalization and
//! the link classifier that gates every frontier candidate.

mod classifier;
mod normalize;

// Re-export main functions
pub use classifier::{classify, path_extension, should_skip, skip_reason, LinkScope, SkipReason};
pub use normalize::{is_valid_url, normalize_url, parse_base_url, with_default_scheme};
