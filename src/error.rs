use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing job identifier; refusing to start a poll session")]
    MissingJobId,

    #[error("Missing property identifier; refusing to submit an analysis")]
    MissingPropertyId,

    #[error("Invalid poll options: {0}")]
    InvalidOptions(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
