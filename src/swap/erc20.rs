//! ERC20 allowance/balance reads, approvals and WETH wrapping

use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::debug;

use crate::error::{DexError, DexResult};
use crate::tokens::Token;
use crate::units::format_token_amount;

sol! {
    #[derive(Debug)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Wrapped native token
    #[derive(Debug)]
    interface IWETH9 {
        function deposit() external payable;
        function withdraw(uint256 wad) external;
    }
}

/// Wallet-side token state the swap flow depends on
#[async_trait]
pub trait TokenState: Send + Sync {
    async fn balance_of(&self, token: &Token, owner: Address) -> Result<U256>;
    async fn allowance(&self, token: &Token, owner: Address, spender: Address) -> Result<U256>;
}

/// Read-only token state over eth_call
pub struct Erc20Reader {
    rpc_url: String,
}

impl Erc20Reader {
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }

    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<alloy_primitives::Bytes> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.parse()?);
        let tx = TransactionRequest::default().to(to).input(calldata.into());
        provider
            .call(tx)
            .await
            .map_err(|e| eyre!("eth_call to {:?} failed: {}", to, e))
    }

    /// Native balance, for wrapping
    pub async fn native_balance(&self, owner: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.parse()?);
        Ok(provider.get_balance(owner).await?)
    }
}

#[async_trait]
impl TokenState for Erc20Reader {
    async fn balance_of(&self, token: &Token, owner: Address) -> Result<U256> {
        let calldata = IERC20::balanceOfCall { account: owner }.abi_encode();
        let output = self.call(token.address, calldata).await?;
        let balance = IERC20::balanceOfCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode balanceOf: {}", e))?;

        debug!("{} balance of {:?}: {}", token, owner, balance);
        Ok(balance)
    }

    async fn allowance(&self, token: &Token, owner: Address, spender: Address) -> Result<U256> {
        let calldata = IERC20::allowanceCall { owner, spender }.abi_encode();
        let output = self.call(token.address, calldata).await?;
        let allowance = IERC20::allowanceCall::abi_decode_returns(&output)
            .map_err(|e| eyre!("Failed to decode allowance: {}", e))?;

        debug!("{} allowance {:?} -> {:?}: {}", token, owner, spender, allowance);
        Ok(allowance)
    }
}

/// Unsigned transaction builders for token housekeeping
pub struct TokenTransactions;

impl TokenTransactions {
    /// `approve(spender, amount)` on the token
    pub fn approve(token: &Token, owner: Address, spender: Address, amount: U256) -> TransactionRequest {
        let calldata = IERC20::approveCall { spender, amount }.abi_encode();
        TransactionRequest::default()
            .from(owner)
            .to(token.address)
            .input(calldata.into())
    }

    /// WETH `deposit()` carrying `amount` of native currency
    pub fn wrap(weth: &Token, owner: Address, amount: U256) -> TransactionRequest {
        TransactionRequest::default()
            .from(owner)
            .to(weth.address)
            .value(amount)
            .input(IWETH9::depositCall {}.abi_encode().into())
    }

    /// WETH `withdraw(amount)`
    pub fn unwrap(weth: &Token, owner: Address, amount: U256) -> TransactionRequest {
        let calldata = IWETH9::withdrawCall { wad: amount }.abi_encode();
        TransactionRequest::default()
            .from(owner)
            .to(weth.address)
            .input(calldata.into())
    }
}

/// Approval is needed whenever the router may not yet pull `amount`
pub fn needs_approval(allowance: U256, amount: U256) -> bool {
    allowance < amount
}

/// Fail before submission when the wallet cannot cover `required`
pub fn ensure_balance(symbol: &str, decimals: u8, balance: U256, required: U256) -> DexResult<()> {
    if balance < required {
        return Err(DexError::InsufficientBalance {
            symbol: symbol.to_string(),
            balance: format_token_amount(balance, decimals),
            required: format_token_amount(required, decimals),
        });
    }
    Ok(())
}
