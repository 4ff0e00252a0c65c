//! Error types for wardend

use thiserror::Error;

/// Core error type for wardend operations
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("House index {index} out of range (configured total: {total})")]
    InvalidHouse { index: usize, total: usize },

    #[error("Wall clock unavailable: {0}")]
    ClockUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    pub fn clock(msg: impl Into<String>) -> Self {
        Self::ClockUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;
