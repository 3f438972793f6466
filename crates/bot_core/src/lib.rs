//! bot_core - configuration and filesystem layout shared by the task bot crates
//!
//! - `config` - `Config` resolved from `config.toml` and environment variables
//! - `paths` - data directory and default file locations

pub mod config;
pub mod paths;

pub use config::{Config, ProxyAuth};
