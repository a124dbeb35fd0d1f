//! Configuration system for the skiff browser core.
//!
//! This crate provides:
//! - YAML config loading with sensible defaults (`Config`)
//! - Environment variable substitution in config values (`${VAR}`,
//!   `${VAR:-default}`, `$${` escape)
//! - Typed error variants for I/O, parse, and validation failures
//! - Platform path helpers for the config and data directories

pub mod config;
pub mod defaults;
pub mod env_vars;
pub mod error;

// Re-export main types for convenience
pub use config::Config;
pub use env_vars::substitute_variables;
pub use error::ConfigError;
