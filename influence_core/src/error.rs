//! Error types for the influence graph.
//!
//! Graph and sync operations do not fail: bad data reads as empty and write
//! failures are logged per counterpart. Only setup can return an error.

/// Errors raised while configuring the influence service.
#[derive(Debug, thiserror::Error)]
pub enum InfluenceError {
    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, InfluenceError>;
