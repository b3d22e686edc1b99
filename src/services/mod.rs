//! Core services: host configuration, pattern compilation and remote search

pub mod config;
pub mod pattern;
pub mod search;

pub use config::{ConfigError, ConfigOverrides, HostConfig, default_config_path};
pub use pattern::{CompiledPattern, FileGlob};
pub use search::SearchService;
