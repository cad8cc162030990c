//! Configuration module for Scopecrawl
//!
//! This module handles loading, parsing, and validating TOML session
//! configuration files.
//!
//! # Example
//!
//! ```no_run
//! use scopecrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawling from: {}", config.scope.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ScopeConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
