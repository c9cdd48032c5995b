use thiserror::Error;

/// Configuration and input errors raised by the data model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Network name not in the supported table.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
    /// Malformed address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
