//! Error kinds returned by the library.

use thiserror::Error;

/// Errors raised by address-space queries, allocation and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IpamError {
    /// A record failed validation (uniqueness, bounds, references).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Address or CIDR text that could not be parsed.
    #[error("invalid value '{value}': {reason}")]
    Parse { value: String, reason: String },
    /// No free block, address or id of the requested shape is left.
    #[error("exhausted: {0}")]
    Exhaustion(String),
    /// A request that can never be satisfied by the given container.
    #[error("invalid request: {0}")]
    Input(String),
    /// Unknown record id.
    #[error("{kind} #{id} not found")]
    NotFound { kind: &'static str, id: u32 },
    /// Dataset file could not be read or written.
    #[error("dataset error: {0}")]
    Dataset(String),
}

impl IpamError {
    pub(crate) fn parse(value: &str, reason: impl Into<String>) -> Self {
        IpamError::Parse {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the kinds that reject a record before it is written.
    pub fn is_validation(&self) -> bool {
        matches!(self, IpamError::Validation(_) | IpamError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, IpamError>;
