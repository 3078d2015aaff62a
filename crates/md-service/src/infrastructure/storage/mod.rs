//! Storage infrastructure: TOML configuration persistence.

pub mod config;
