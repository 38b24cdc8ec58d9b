//! Quoting
//!
//! Responsible for:
//! - Discovering the Uniswap V3 pools of a token pair (factory)
//! - Simulating an exact-input quote against every pool (quoter)
//! - Picking the pool with the best output
//! - Debouncing quote requests from a changing input

mod fetcher;
mod pool_cache;
mod reader;
mod scheduler;

pub use fetcher::{select_best, QuoteFetcher};
pub use pool_cache::{PairKey, PoolCache, DEFAULT_POOL_CACHE_TTL};
pub use reader::{verify_endpoint, UniswapV3Reader};
pub use scheduler::{QuoteScheduler, QuoteState, DEFAULT_DEBOUNCE};

#[cfg(test)]
pub(crate) use fetcher::tests as mocks;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::tokens::Token;

/// Uniswap V3 fee tier in hundredths of a bip (3000 = 0.3%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeeTier(pub u32);

impl FeeTier {
    pub const LOWEST: FeeTier = FeeTier(100);
    pub const LOW: FeeTier = FeeTier(500);
    pub const MEDIUM: FeeTier = FeeTier(3000);
    pub const HIGH: FeeTier = FeeTier(10_000);

    /// Tiers enabled on every canonical V3 factory
    pub const ALL: [FeeTier; 4] = [Self::LOWEST, Self::LOW, Self::MEDIUM, Self::HIGH];

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl std::fmt::Display for FeeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

/// A deployed pool of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInfo {
    pub address: Address,
    pub fee: FeeTier,
}

/// Exact-input quote request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: U256,
}

/// Best achievable output for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee: FeeTier,
    pub pool: Address,
    /// Pools that were simulated
    pub pools_considered: usize,
    /// Pools whose simulation failed (counted as zero)
    pub failed_simulations: usize,
}

/// Why a single pool simulation produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationFailure {
    /// The quoter reverted: no liquidity or the swap cannot execute
    Reverted(String),
    /// The RPC call itself failed
    Transport(String),
    TimedOut,
}

impl std::fmt::Display for SimulationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationFailure::Reverted(reason) => write!(f, "reverted: {}", reason),
            SimulationFailure::Transport(reason) => write!(f, "transport error: {}", reason),
            SimulationFailure::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Pool discovery (factory reads)
#[async_trait]
pub trait PoolSource: Send + Sync {
    async fn pools(&self, token_a: Address, token_b: Address) -> eyre::Result<Vec<PoolInfo>>;
}

/// Off-chain exact-input simulation (quoter reads)
#[async_trait]
pub trait QuoteSimulator: Send + Sync {
    async fn simulate(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee: FeeTier,
    ) -> Result<U256, SimulationFailure>;
}
