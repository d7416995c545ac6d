//! Recoverable errors surfaced by the coordinator, balancer, and configuration.

use thiserror::Error;

/// Errors returned by coordinator and balancer operations.
///
/// None of these are fatal: the operation is aborted without changing state
/// and the caller decides how to report it. A device that cannot be powered
/// is not an error; it is recorded as [`crate::sim::Outcome::Unpowered`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HouseError {
    #[error("invalid index {index} (collection has {len} entries)")]
    InvalidIndex { index: usize, len: usize },
    #[error("no active energy source is set")]
    NoActiveSource,
    #[error("smart object '{0}' not found")]
    DeviceNotFound(String),
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"sources[1].capacity_w"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
