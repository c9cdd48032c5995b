//! Prelude module for convenient imports.
//!
//! ```rust
//! use custody_protocols::prelude::*;
//! ```

pub use crate::aave_v3::AaveV3Pool;
pub use crate::cache::LoadOnceCache;
pub use crate::capabilities::{
    AddLiquidityParams, Exchange, Lending, RemoveLiquidityParams, Staking, SwapParams,
};
pub use crate::chain::{ChainClient, ChainError, ReceiptInfo, RpcConfig, RpcProvider};
pub use crate::custody::{
    CreateTransactionRequest, CreateTransactionResponse, CustodyApi, CustodyApiConfig,
    CustodyApiError, CustodyClient, ExternalWallet, TransferPeerPath, WalletAsset,
};
pub use crate::events::{EventReader, EventReaderConfig, block_intervals};
pub use crate::staking_rewards::StakingRewards;
pub use crate::uniswap_v2::UniswapV2Router;
