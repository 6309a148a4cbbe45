//! Configuration management for the avatar voice front-end
//!
//! Supports loading configuration from:
//! - JSON files (`config/default.json`, `config/{env}.json`)
//! - Environment variables (AVATAR_VOICE__ prefix)
//!
//! The emotion→motion registry is loaded separately from its own JSON file;
//! a missing or unparsable registry prevents startup.

pub mod emotion;
pub mod settings;

pub use emotion::{EmotionRegistry, ResolvedMotion};
pub use settings::{
    load_settings, MonitorConfig, SegmenterConfig, ServiceEndpoints, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
