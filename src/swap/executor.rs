//! Transaction submission
//!
//! Dry-run mode only reports what would be sent. Live mode signs with the
//! configured key, sends once and waits for the receipt. Nothing is retried.
//!
//! ⚠️  WARNING: Live mode moves real funds!

use alloy_network::{EthereumWallet, ReceiptResponse};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub use crate::config::ExecutionMode;
use crate::config::Config;

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Built but not sent
    DryRun {
        to: Option<Address>,
        value: U256,
        calldata_len: usize,
    },

    /// Mined with success status
    Confirmed {
        tx_hash: B256,
        block: Option<u64>,
    },

    /// Rejected, reverted or not confirmed in time
    Failed {
        tx_hash: Option<B256>,
        reason: String,
    },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::DryRun { .. } | ExecutionResult::Confirmed { .. })
    }
}

/// Where signed transactions go
#[async_trait]
pub trait TransactionSender: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    /// Address transactions are sent from
    fn sender(&self) -> Option<Address>;

    /// Send `tx` (or describe it in dry-run mode). `label` is for logs only.
    async fn execute(&self, label: &str, tx: TransactionRequest) -> Result<ExecutionResult>;
}

pub struct SwapExecutor {
    rpc_url: String,
    mode: ExecutionMode,
    signer: Option<PrivateKeySigner>,
    receipt_timeout: Duration,
}

impl SwapExecutor {
    pub fn new(
        rpc_url: String,
        mode: ExecutionMode,
        signer: Option<PrivateKeySigner>,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            rpc_url,
            mode,
            signer,
            receipt_timeout,
        }
    }

    /// Build from config for `chain_id`, loading the signer when a key is present
    pub fn from_config(config: &Config, chain_id: u64) -> Result<Self> {
        let signer = match &config.private_key {
            Some(key) => {
                let signer = PrivateKeySigner::from_str(key.trim_start_matches("0x"))
                    .map_err(|e| eyre!("Failed to parse PRIVATE_KEY: {}", e))?;
                info!("✓ Wallet loaded: {:?}", signer.address());
                Some(signer)
            }
            None => None,
        };

        if config.execution_mode == ExecutionMode::Live && signer.is_none() {
            return Err(eyre!("Live mode requires PRIVATE_KEY"));
        }

        Ok(Self::new(
            config.rpc_url_for(chain_id).to_string(),
            config.execution_mode,
            signer,
            config.receipt_timeout(),
        ))
    }

    async fn send(&self, label: &str, tx: TransactionRequest) -> Result<ExecutionResult> {
        let signer = self
            .signer
            .clone()
            .ok_or_else(|| eyre!("Live mode requires PRIVATE_KEY"))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc_url.parse()?);

        let pending = match provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("{} transaction rejected: {}", label, e);
                return Ok(ExecutionResult::Failed {
                    tx_hash: None,
                    reason: format!("rejected: {}", e),
                });
            }
        };

        let tx_hash = *pending.tx_hash();
        info!("🚀 {} transaction sent: {:?}", label, tx_hash);

        let receipt = match tokio::time::timeout(self.receipt_timeout, pending.get_receipt()).await {
            Err(_) => {
                warn!("{} transaction {:?} not confirmed within {:?}", label, tx_hash, self.receipt_timeout);
                return Ok(ExecutionResult::Failed {
                    tx_hash: Some(tx_hash),
                    reason: format!("not confirmed within {}s", self.receipt_timeout.as_secs()),
                });
            }
            Ok(Err(e)) => {
                warn!("{} transaction {:?} receipt unavailable: {}", label, tx_hash, e);
                return Ok(ExecutionResult::Failed {
                    tx_hash: Some(tx_hash),
                    reason: e.to_string(),
                });
            }
            Ok(Ok(receipt)) => receipt,
        };

        if !receipt.status() {
            warn!("{} transaction {:?} reverted", label, tx_hash);
            return Ok(ExecutionResult::Failed {
                tx_hash: Some(tx_hash),
                reason: "reverted".to_string(),
            });
        }

        info!("✅ {} transaction confirmed in block {:?}", label, receipt.block_number);
        Ok(ExecutionResult::Confirmed {
            tx_hash,
            block: receipt.block_number,
        })
    }
}

#[async_trait]
impl TransactionSender for SwapExecutor {
    fn mode(&self) -> ExecutionMode {
        self.mode
    }

    fn sender(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn execute(&self, label: &str, tx: TransactionRequest) -> Result<ExecutionResult> {
        match self.mode {
            ExecutionMode::DryRun => {
                let result = ExecutionResult::DryRun {
                    to: tx.to.and_then(|kind| kind.to().copied()),
                    value: tx.value.unwrap_or_default(),
                    calldata_len: tx.input.input().map(|b| b.len()).unwrap_or(0),
                };
                info!("📋 DRY RUN: would send {} transaction: {:?}", label, result);
                Ok(result)
            }
            ExecutionMode::Live => self.send(label, tx).await,
        }
    }
}
