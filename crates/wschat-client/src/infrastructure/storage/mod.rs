//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from `--config`
//! or the platform config directory, falling back to defaults on first run.

pub mod config;
