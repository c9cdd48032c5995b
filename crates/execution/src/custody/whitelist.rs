//! Destination whitelist resolution.

use crate::error::WhitelistError;
use alloy::primitives::Address;
use custody_domain::DestinationDescriptor;
use custody_protocols::custody::CustodyClient;
use std::sync::Arc;
use tracing::debug;

/// Maps target addresses to whitelisted custody destinations.
pub struct WhitelistResolver {
    custody: Arc<dyn CustodyClient>,
}

impl WhitelistResolver {
    #[must_use]
    pub fn new(custody: Arc<dyn CustodyClient>) -> Self {
        Self { custody }
    }

    /// Resolves `target` to the external wallet listing it under `asset`.
    ///
    /// Addresses match case-insensitively. The listing is fetched on every
    /// call and never retried.
    ///
    /// # Errors
    /// [`WhitelistError::WrongAsset`] if the address is listed only under
    /// other assets, [`WhitelistError::NotWhitelisted`] if it is not listed at
    /// all, [`WhitelistError::Listing`] if the listing cannot be fetched.
    pub async fn resolve(
        &self,
        target: Address,
        asset: &str,
    ) -> Result<DestinationDescriptor, WhitelistError> {
        let wallets = self
            .custody
            .external_wallets()
            .await
            .map_err(WhitelistError::Listing)?;

        let wanted = target.to_string().to_lowercase();
        let mut address_listed = false;

        for wallet in &wallets {
            for entry in &wallet.assets {
                if entry.address.trim().to_lowercase() != wanted {
                    continue;
                }
                address_listed = true;
                if entry.id == asset {
                    debug!(address = %target, wallet = %wallet.id, asset, "Destination whitelisted");
                    return Ok(DestinationDescriptor::ExternalWallet(wallet.id.clone()));
                }
            }
        }

        if address_listed {
            Err(WhitelistError::WrongAsset {
                address: target,
                asset: asset.to_string(),
            })
        } else {
            Err(WhitelistError::NotWhitelisted { address: target })
        }
    }
}
