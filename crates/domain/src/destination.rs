use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a custody submission is sent.
///
/// Resolved once before submission and fixed for the submission's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationDescriptor {
    /// Another vault account inside the custody workspace.
    VaultAccount(String),
    /// A whitelisted external wallet, by whitelist id.
    ExternalWallet(String),
    /// A raw address exempt from whitelisting. Test mode only.
    OneTimeAddress(Address),
}

impl DestinationDescriptor {
    /// Whether this destination bypasses the whitelist.
    #[must_use]
    pub fn is_one_time(&self) -> bool {
        matches!(self, Self::OneTimeAddress(_))
    }
}

impl fmt::Display for DestinationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VaultAccount(id) => write!(f, "vault:{id}"),
            Self::ExternalWallet(id) => write!(f, "external-wallet:{id}"),
            Self::OneTimeAddress(address) => write!(f, "one-time:{address}"),
        }
    }
}
