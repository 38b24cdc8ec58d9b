//! Uniswap V3 chain reader - Provider-based eth_call
//!
//! Pool discovery goes through the factory's getPool for every standard fee
//! tier; quotes go through the Quoter's quoteExactInputSingle. Both are
//! read-only simulations, nothing is signed here.

use alloy_primitives::aliases::{U160, U24};
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use alloy_transport::{RpcError, TransportError};
use async_trait::async_trait;
use eyre::{eyre, Result};
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, trace};

use super::{FeeTier, PoolInfo, PoolSource, QuoteSimulator, SimulationFailure};
use crate::chains::{ensure_endpoint_chain, DexContracts, SupportedChain};
use crate::error::DexError;

/// Quoter calls that take longer than this count as a failed pool
pub const DEFAULT_SIMULATION_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================
// SOLIDITY INTERFACES
// ============================================

sol! {
    /// Uniswap V3 Factory
    #[derive(Debug)]
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee)
            external view returns (address pool);
    }

    /// Uniswap V3 Quoter (V1 ABI: single return value)
    #[derive(Debug)]
    interface IQuoter {
        function quoteExactInputSingle(
            address tokenIn,
            address tokenOut,
            uint24 fee,
            uint256 amountIn,
            uint160 sqrtPriceLimitX96
        ) external returns (uint256 amountOut);
    }
}

/// Reads factory and quoter state for one chain
pub struct UniswapV3Reader {
    rpc_url: String,
    contracts: DexContracts,
    simulation_timeout: Duration,
}

impl UniswapV3Reader {
    pub fn new(rpc_url: String, contracts: DexContracts) -> Self {
        Self {
            rpc_url,
            contracts,
            simulation_timeout: DEFAULT_SIMULATION_TIMEOUT,
        }
    }

    pub fn with_simulation_timeout(mut self, timeout: Duration) -> Self {
        self.simulation_timeout = timeout;
        self
    }

    pub fn contracts(&self) -> &DexContracts {
        &self.contracts
    }

    fn provider(&self) -> Result<impl Provider> {
        Ok(ProviderBuilder::new().connect_http(self.rpc_url.parse()?))
    }

    async fn call_contract(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes, TransportError> {
        let provider = self
            .provider()
            .map_err(|e| TransportError::local_usage_str(&e.to_string()))?;

        let tx = TransactionRequest::default()
            .to(to)
            .input(calldata.into());

        provider.call(tx).await
    }

    /// Pool address for one fee tier, `None` when not deployed
    async fn get_pool(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Option<Address>> {
        let calldata = IUniswapV3Factory::getPoolCall {
            tokenA: token_a,
            tokenB: token_b,
            fee: U24::from(fee.0),
        }
        .abi_encode();

        let output = self
            .call_contract(self.contracts.factory, calldata)
            .await
            .map_err(|e| eyre!("getPool eth_call failed: {}", e))?;

        let pool = IUniswapV3Factory::getPoolCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode getPool output: {}", e))?;

        Ok((pool != Address::ZERO).then_some(pool))
    }
}

#[async_trait]
impl PoolSource for UniswapV3Reader {
    async fn pools(&self, token_a: Address, token_b: Address) -> Result<Vec<PoolInfo>> {
        let lookups = FeeTier::ALL
            .iter()
            .map(|fee| self.get_pool(token_a, token_b, *fee));
        let results = join_all(lookups).await;

        let mut pools = Vec::new();
        for (fee, result) in FeeTier::ALL.iter().zip(results) {
            if let Some(address) = result? {
                trace!("Pool {:?} at fee {}", address, fee);
                pools.push(PoolInfo { address, fee: *fee });
            }
        }

        debug!("Factory returned {} pools for {:?}/{:?}", pools.len(), token_a, token_b);
        Ok(pools)
    }
}

#[async_trait]
impl QuoteSimulator for UniswapV3Reader {
    async fn simulate(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee: FeeTier,
    ) -> Result<U256, SimulationFailure> {
        let calldata = IQuoter::quoteExactInputSingleCall {
            tokenIn: token_in,
            tokenOut: token_out,
            fee: U24::from(fee.0),
            amountIn: amount_in,
            sqrtPriceLimitX96: U160::ZERO,
        }
        .abi_encode();

        let call = self.call_contract(self.contracts.quoter, calldata);
        let output = match tokio::time::timeout(self.simulation_timeout, call).await {
            Err(_) => return Err(SimulationFailure::TimedOut),
            Ok(Err(e)) => return Err(classify(e)),
            Ok(Ok(output)) => output,
        };

        IQuoter::quoteExactInputSingleCall::abi_decode_returns(&output)
            .map_err(|e| SimulationFailure::Reverted(format!("undecodable quoter output: {}", e)))
    }
}

/// Fail unless `rpc_url` serves the `active` network
pub async fn verify_endpoint(rpc_url: &str, active: SupportedChain) -> Result<()> {
    let provider = ProviderBuilder::new().connect_http(rpc_url.parse()?);
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| DexError::Rpc(format!("eth_chainId failed: {}", e)))?;

    ensure_endpoint_chain(chain_id, active)?;
    debug!("Endpoint serves {}", active);
    Ok(())
}

/// A JSON-RPC error response means the node executed the call and it reverted
fn classify(error: TransportError) -> SimulationFailure {
    match error {
        RpcError::ErrorResp(payload) => SimulationFailure::Reverted(payload.message.to_string()),
        other => SimulationFailure::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::contract_addresses;

    #[test]
    fn test_quote_calldata_selector() {
        let calldata = IQuoter::quoteExactInputSingleCall {
            tokenIn: Address::repeat_byte(1),
            tokenOut: Address::repeat_byte(2),
            fee: U24::from(3000u32),
            amountIn: U256::from(10u64),
            sqrtPriceLimitX96: U160::ZERO,
        }
        .abi_encode();

        // quoteExactInputSingle(address,address,uint24,uint256,uint160)
        assert_eq!(&calldata[..4], &IQuoter::quoteExactInputSingleCall::SELECTOR);
        assert_eq!(hex::encode(&calldata[..4]), "f7729d43");
        assert_eq!(calldata.len(), 4 + 5 * 32);
    }

    #[test]
    fn test_get_pool_selector() {
        // getPool(address,address,uint24)
        assert_eq!(hex::encode(IUniswapV3Factory::getPoolCall::SELECTOR), "1698ee82");
    }

    #[test]
    fn test_reader_uses_chain_contracts() {
        let contracts = contract_addresses(1).unwrap();
        let reader = UniswapV3Reader::new("http://localhost:8545".into(), contracts)
            .with_simulation_timeout(Duration::from_millis(250));

        assert_eq!(reader.contracts().quoter, contracts.quoter);
        assert_eq!(reader.simulation_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_rpc_error() {
        let err = verify_endpoint("http://127.0.0.1:1", crate::chains::DEFAULT_CHAIN)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast::<DexError>().unwrap(), DexError::Rpc(_)));
    }
}
