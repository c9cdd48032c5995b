//! Supported networks and their custody asset bindings.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EVM network the custody vault operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Goerli,
    Sepolia,
    Polygon,
    PolygonMumbai,
    Arbitrum,
    Optimism,
    Avalanche,
    AvalancheFuji,
    Bsc,
    BscTest,
    Fantom,
    Celo,
    Moonbeam,
}

impl Network {
    /// All supported networks.
    pub const ALL: [Network; 14] = [
        Network::Mainnet,
        Network::Goerli,
        Network::Sepolia,
        Network::Polygon,
        Network::PolygonMumbai,
        Network::Arbitrum,
        Network::Optimism,
        Network::Avalanche,
        Network::AvalancheFuji,
        Network::Bsc,
        Network::BscTest,
        Network::Fantom,
        Network::Celo,
        Network::Moonbeam,
    ];

    /// Custody asset id of the network's native coin.
    #[must_use]
    pub fn asset_id(&self) -> &'static str {
        match self {
            Self::Mainnet => "ETH",
            Self::Goerli => "ETH_TEST3",
            Self::Sepolia => "ETH_TEST5",
            Self::Polygon => "MATIC_POLYGON",
            Self::PolygonMumbai => "MATIC_POLYGON_MUMBAI",
            Self::Arbitrum => "ETH-AETH",
            Self::Optimism => "ETH-OPT",
            Self::Avalanche => "AVAX",
            Self::AvalancheFuji => "AVAXTEST",
            Self::Bsc => "BNB_BSC",
            Self::BscTest => "BNB_TEST",
            Self::Fantom => "FTM_FANTOM",
            Self::Celo => "CELO",
            Self::Moonbeam => "GLMR_GLMR",
        }
    }

    /// Public RPC endpoint used when no override is configured.
    #[must_use]
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://cloudflare-eth.com",
            Self::Goerli => "https://rpc.ankr.com/eth_goerli",
            Self::Sepolia => "https://rpc.sepolia.org",
            Self::Polygon => "https://polygon-rpc.com",
            Self::PolygonMumbai => "https://rpc-mumbai.maticvigil.com",
            Self::Arbitrum => "https://rpc.ankr.com/arbitrum",
            Self::Optimism => "https://rpc.ankr.com/optimism",
            Self::Avalanche => "https://api.avax.network/ext/bc/C/rpc",
            Self::AvalancheFuji => "https://api.avax-test.network/ext/bc/C/rpc",
            Self::Bsc => "https://bsc-dataseed.binance.org",
            Self::BscTest => "https://data-seed-prebsc-1-s1.binance.org:8545",
            Self::Fantom => "https://rpc.ftm.tools",
            Self::Celo => "https://rpc.ankr.com/celo",
            Self::Moonbeam => "https://rpc.api.moonbeam.network",
        }
    }

    /// EIP-155 chain id.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Goerli => 5,
            Self::Sepolia => 11_155_111,
            Self::Polygon => 137,
            Self::PolygonMumbai => 80_001,
            Self::Arbitrum => 42_161,
            Self::Optimism => 10,
            Self::Avalanche => 43_114,
            Self::AvalancheFuji => 43_113,
            Self::Bsc => 56,
            Self::BscTest => 97,
            Self::Fantom => 250,
            Self::Celo => 42_220,
            Self::Moonbeam => 1_284,
        }
    }

    /// Largest block span a single log query may cover.
    #[must_use]
    pub fn log_block_interval(&self) -> u64 {
        match self {
            // Polygon providers reject ranges of 3 500 blocks or more.
            Self::Polygon | Self::PolygonMumbai => 3_499,
            _ => 10_000,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Goerli => "goerli",
            Self::Sepolia => "sepolia",
            Self::Polygon => "polygon",
            Self::PolygonMumbai => "polygon_mumbai",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Avalanche => "avalanche",
            Self::AvalancheFuji => "avalanche_fuji",
            Self::Bsc => "bsc",
            Self::BscTest => "bsc_test",
            Self::Fantom => "fantom",
            Self::Celo => "celo",
            Self::Moonbeam => "moonbeam",
        }
    }
}

impl FromStr for Network {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "ethereum" | "eth" => return Ok(Self::Mainnet),
            "mumbai" => return Ok(Self::PolygonMumbai),
            "fuji" => return Ok(Self::AvalancheFuji),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|network| network.name() == normalized)
            .ok_or_else(|| DomainError::UnknownNetwork(s.to_string()))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_names() {
        assert_eq!("mainnet".parse::<Network>(), Ok(Network::Mainnet));
        assert_eq!("Polygon".parse::<Network>(), Ok(Network::Polygon));
        assert_eq!(
            "avalanche-fuji".parse::<Network>(),
            Ok(Network::AvalancheFuji)
        );
        assert_eq!("mumbai".parse::<Network>(), Ok(Network::PolygonMumbai));
        assert_eq!(
            "solana".parse::<Network>(),
            Err(DomainError::UnknownNetwork("solana".to_string()))
        );
    }

    #[test]
    fn test_names_round_trip_for_every_network() {
        for network in Network::ALL {
            assert_eq!(network.name().parse::<Network>(), Ok(network));
        }
    }

    #[test]
    fn test_asset_bindings() {
        assert_eq!(Network::Mainnet.asset_id(), "ETH");
        assert_eq!(Network::Polygon.asset_id(), "MATIC_POLYGON");
        assert_eq!(Network::Avalanche.chain_id(), 43_114);
        assert_eq!(Network::Polygon.log_block_interval(), 3_499);
        assert_eq!(Network::Mainnet.log_block_interval(), 10_000);
    }
}
