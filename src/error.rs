//! Error taxonomy for quoting, slippage and swap construction
//!
//! Per-pool simulation failures are NOT errors here: they are absorbed to a
//! zero output inside the quote fetcher (see `quote::SimulationFailure`).

use alloy_primitives::Address;
use thiserror::Error;

/// Core errors surfaced to the user
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DexError {
    // ========== Configuration ==========
    #[error("No contract addresses registered for chain {0}")]
    UnsupportedChain(u64),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("RPC endpoint is on chain {actual} but the active network is chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Chain {0} has no SwapRouter / Quoter V1 deployment configured")]
    IncompatibleContracts(u64),

    // ========== Routing ==========
    #[error("No path found for this token pair ({token_in:?} -> {token_out:?})")]
    NoRoute { token_in: Address, token_out: Address },

    // ========== Validation ==========
    #[error("Slippage must be between 0.01% and 50% (got {0})")]
    InvalidSlippage(f64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Deadline {deadline} must be in the future and at most {max_secs}s from now ({now})")]
    InvalidDeadline { deadline: u64, now: u64, max_secs: u64 },

    #[error("Not enough {symbol}: balance {balance}, required {required}")]
    InsufficientBalance {
        symbol: String,
        balance: String,
        required: String,
    },

    // ========== Chain access ==========
    #[error("RPC request failed: {0}")]
    Rpc(String),

    // ========== Submission ==========
    #[error("Transaction failed: {0}")]
    Submission(String),

    #[error("Illegal swap state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl DexError {
    /// Validation errors are raised before any network interaction
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DexError::InvalidSlippage(_)
                | DexError::InvalidAmount(_)
                | DexError::InvalidDeadline { .. }
                | DexError::InsufficientBalance { .. }
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DexError::UnsupportedChain(_)
                | DexError::UnknownToken(_)
                | DexError::ChainMismatch { .. }
                | DexError::IncompatibleContracts(_)
        )
    }
}

pub type DexResult<T> = std::result::Result<T, DexError>;
