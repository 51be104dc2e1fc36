//! Configuration module for Site-Audit
//!
//! Two layers live here: the optional TOML file describing the crawler
//! process (workers, timeouts, user agent, option defaults) and the per-job
//! [`CrawlOptions`] resolved from caller input.
//!
//! # Example
//!
//! ```no_run
//! use site_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-audit.toml")).unwrap();
//! println!("Crawling with {} workers", config.crawler.workers);
//! ```

mod options;
mod parser;
mod types;
mod validation;

// Re-export types
pub use options::{CrawlMode, CrawlOptions, CrawlOptionsInput};
pub use types::{Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
