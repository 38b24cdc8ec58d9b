//! End-to-end swap attempt
//!
//! quote → effective slippage → balance / allowance → [approve → re-quote] → swap.
//! Each step is reflected in `SwapPhase`; a failure at any step ends the
//! attempt without retrying. When an approval had to be confirmed first, the
//! router call is rebuilt from a fresh quote so its deadline and minimum
//! output start counting after the approval.

use alloy_primitives::{Address, B256};
use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    ensure_balance, needs_approval, prepare_swap, ExecutionMode, ExecutionResult, PreparedSwap,
    SwapPhase, SwapRequest, TokenState, TokenTransactions, TransactionSender,
};
use crate::error::DexError;
use crate::quote::{Quote, QuoteFetcher, QuoteRequest};
use crate::slippage::SlippageSettings;
use crate::units::to_token_units_f64;

/// How an attempt ended
#[derive(Debug, Clone)]
pub enum SwapOutcome {
    /// Every pool quoted zero
    NoRoute,

    /// Built and described, nothing sent. `approval_needed` is unknown
    /// without a wallet.
    DryRun {
        quote: Quote,
        slippage: f64,
        swap: PreparedSwap,
        approval_needed: Option<bool>,
    },

    Confirmed {
        quote: Quote,
        slippage: f64,
        swap: PreparedSwap,
        tx_hash: B256,
        block: Option<u64>,
    },

    /// Approval or swap transaction did not go through
    Failed {
        stage: SwapPhase,
        tx_hash: Option<B256>,
        reason: String,
    },
}

pub struct SwapFlow {
    fetcher: Arc<QuoteFetcher>,
    tokens: Arc<dyn TokenState>,
    executor: Box<dyn TransactionSender>,
    router: Address,
    phase: SwapPhase,
}

impl SwapFlow {
    pub fn new(
        fetcher: Arc<QuoteFetcher>,
        tokens: Arc<dyn TokenState>,
        executor: Box<dyn TransactionSender>,
        router: Address,
    ) -> Self {
        Self {
            fetcher,
            tokens,
            executor,
            router,
            phase: SwapPhase::Idle,
        }
    }

    pub fn phase(&self) -> SwapPhase {
        self.phase
    }

    fn enter(&mut self, next: SwapPhase) -> Result<()> {
        debug!("Swap phase {} -> {}", self.phase, next);
        self.phase.advance(next)?;
        Ok(())
    }

    fn fail(&mut self, error: DexError) -> Result<SwapOutcome> {
        self.enter(SwapPhase::Failed)?;
        Err(error.into())
    }

    /// Run one attempt. Output goes to `recipient`; `deadline` as in `SwapRequest`.
    pub async fn run(
        &mut self,
        request: &QuoteRequest,
        settings: &SlippageSettings,
        recipient: Address,
        deadline: Option<u64>,
    ) -> Result<SwapOutcome> {
        // A previous attempt may have stopped on an RPC error mid-way
        if self.phase != SwapPhase::Idle {
            debug!("Resetting swap phase {} -> idle", self.phase);
            self.phase = SwapPhase::Idle;
        }

        self.enter(SwapPhase::Quoting)?;
        let quote = match self.fetcher.quote(request).await {
            Ok(quote) => quote,
            Err(DexError::NoRoute { .. }) => {
                self.enter(SwapPhase::NoRoute)?;
                return Ok(SwapOutcome::NoRoute);
            }
            Err(e) => return self.fail(e),
        };
        self.enter(SwapPhase::Quoted)?;

        // Swap size in whole tokens stands in for its dollar value
        let swap_size = to_token_units_f64(request.amount_in, request.token_in.decimals);
        let slippage = settings.effective(request.token_in.symbol, request.token_out.symbol, swap_size);
        debug!(
            "Effective slippage {}% (manual {}%, protected={})",
            slippage, settings.slippage, settings.protected_mode
        );

        let mut swap_request = SwapRequest {
            input_token: request.token_in.clone(),
            input_amount: request.amount_in,
            output_token: request.token_out.clone(),
            expected_output: quote.amount_out,
            recipient,
            fee: quote.fee,
            slippage_percent: slippage,
            deadline,
        };
        let swap = match prepare_swap(&swap_request, self.router) {
            Ok(swap) => swap,
            Err(e) => return self.fail(e),
        };

        let owner = self.executor.sender();
        let approval_needed = match owner {
            Some(owner) => {
                let balance = self.tokens.balance_of(&request.token_in, owner).await?;
                if let Err(e) = ensure_balance(
                    request.token_in.symbol,
                    request.token_in.decimals,
                    balance,
                    request.amount_in,
                ) {
                    return self.fail(e);
                }

                let allowance = self
                    .tokens
                    .allowance(&request.token_in, owner, self.router)
                    .await?;
                Some(needs_approval(allowance, request.amount_in))
            }
            None => None,
        };

        if self.executor.mode() == ExecutionMode::DryRun {
            let from = owner.unwrap_or(recipient);
            self.executor.execute("swap", swap.transaction(from)).await?;
            self.enter(SwapPhase::Idle)?;
            return Ok(SwapOutcome::DryRun {
                quote,
                slippage,
                swap,
                approval_needed,
            });
        }

        let owner = owner.ok_or_else(|| eyre!("Live mode requires a wallet"))?;

        let (quote, swap) = if approval_needed == Some(true) {
            self.enter(SwapPhase::Approving)?;
            info!("Approving {} for the router", request.token_in);
            let approve = TokenTransactions::approve(&request.token_in, owner, self.router, request.amount_in);

            if let ExecutionResult::Failed { tx_hash, reason } = self.executor.execute("approve", approve).await? {
                warn!("Approval failed: {}", reason);
                self.enter(SwapPhase::Failed)?;
                return Ok(SwapOutcome::Failed {
                    stage: SwapPhase::Approving,
                    tx_hash,
                    reason,
                });
            }

            info!("Approval confirmed, re-quoting before the swap");
            let fresh = match self.fetcher.quote(request).await {
                Ok(fresh) => fresh,
                Err(e) => return self.fail(e),
            };
            swap_request.expected_output = fresh.amount_out;
            swap_request.fee = fresh.fee;
            let rebuilt = match prepare_swap(&swap_request, self.router) {
                Ok(rebuilt) => rebuilt,
                Err(e) => return self.fail(e),
            };
            debug!(
                "Rebuilt swap: min out {} -> {}, deadline {} -> {}",
                swap.minimum_output, rebuilt.minimum_output, swap.deadline, rebuilt.deadline
            );
            (fresh, rebuilt)
        } else {
            (quote, swap)
        };

        self.enter(SwapPhase::Submitting)?;
        match self.executor.execute("swap", swap.transaction(owner)).await? {
            ExecutionResult::Confirmed { tx_hash, block } => {
                self.enter(SwapPhase::Confirmed)?;
                Ok(SwapOutcome::Confirmed {
                    quote,
                    slippage,
                    swap,
                    tx_hash,
                    block,
                })
            }
            ExecutionResult::Failed { tx_hash, reason } => {
                self.enter(SwapPhase::Failed)?;
                Ok(SwapOutcome::Failed {
                    stage: SwapPhase::Submitting,
                    tx_hash,
                    reason,
                })
            }
            ExecutionResult::DryRun { .. } => Err(eyre!("Executor returned a dry-run result in live mode")),
        }
    }
}
