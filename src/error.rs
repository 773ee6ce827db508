//! Crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The trip planner answered with an error instead of a plan.
    #[error("planner error {id}: {message}")]
    Planner { id: i64, message: String },

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("geocoding failed: {0}")]
    Geocode(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
