//! Swapper - Uniswap V3 swap client
//!
//! Quotes an exact-input swap against every pool of a pair, applies the
//! user's slippage policy and submits `exactInputSingle` to the router.

pub mod chains;
pub mod config;
pub mod error;
pub mod quote;
pub mod settings;
pub mod slippage;
pub mod swap;
pub mod tokens;
pub mod units;

pub use error::{DexError, DexResult};
