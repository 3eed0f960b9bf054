use thiserror::Error;

use super::config::ConfigError;
use crate::core::grid::GridError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid grid: {source}")]
    Grid {
        #[from]
        source: GridError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
