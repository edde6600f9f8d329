//! Configuration module for Backscroll
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the separate credentials file used by the look-up client.
//!
//! # Example
//!
//! ```no_run
//! use backscroll::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("backscroll.toml")).unwrap();
//! println!("Look-up batch size: {}", config.lookup.batch_size);
//! ```

mod credentials;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, IdentityPolicy, LookupConfig, PipelineConfig, SearchConfig,
};

// Re-export parser functions
pub use credentials::{load_credentials, Credentials};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_BATCH_SIZE};
