//! Configuration module for Kydao-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a crawl can also run from `Config::default()`.
//!
//! # Example
//!
//! ```no_run
//! use kydao_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Walking at most {} pages per player", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DetailConfig, FetcherConfig, StorageConfig, DEFAULT_ACCEPT_LANGUAGE,
    DEFAULT_NONCE_PLACEHOLDER, DEFAULT_SEED_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, compute_content_hash, load_config, load_config_with_hash};
pub use validation::validate;
