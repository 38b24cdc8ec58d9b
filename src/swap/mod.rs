//! Swapping
//!
//! Turns a quote plus the user's slippage preference into a router
//! transaction, handles token approval and WETH wrapping, and submits.
//!
//! ```text
//! Idle → Quoting → NoRoute
//!               ↘ Quoted → [Approving] → Submitting → Confirmed | Failed
//! ```

mod builder;
mod erc20;
mod executor;
mod flow;

pub use builder::{build_swap, prepare_swap, PreparedSwap, MAX_DEADLINE_SECS};
pub use erc20::{ensure_balance, needs_approval, Erc20Reader, TokenState, TokenTransactions};
pub use executor::{ExecutionMode, ExecutionResult, SwapExecutor, TransactionSender};
pub use flow::{SwapFlow, SwapOutcome};

use alloy_primitives::{Address, U256};

use crate::error::{DexError, DexResult};
use crate::quote::FeeTier;
use crate::tokens::Token;

/// Everything needed to build one exact-input swap
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub input_token: Token,
    pub input_amount: U256,
    pub output_token: Token,
    /// Quoted output the minimum is derived from
    pub expected_output: U256,
    pub recipient: Address,
    pub fee: FeeTier,
    pub slippage_percent: f64,
    /// Unix seconds; defaults to now + 300
    pub deadline: Option<u64>,
}

// ============================================
// SWAP PHASES
// ============================================

/// Progress of a single swap attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapPhase {
    Idle,
    Quoting,
    NoRoute,
    Quoted,
    Approving,
    Submitting,
    Confirmed,
    Failed,
}

impl SwapPhase {
    pub fn can_transition_to(&self, next: SwapPhase) -> bool {
        use SwapPhase::*;
        matches!(
            (*self, next),
            (Idle, Quoting)
                | (Quoting, NoRoute)
                | (Quoting, Quoted)
                | (Quoting, Failed)
                | (Quoted, Approving)
                | (Quoted, Submitting)
                | (Quoted, Failed)
                | (Approving, Submitting)
                | (Approving, Failed)
                | (Submitting, Confirmed)
                | (Submitting, Failed)
                // Dry runs stop after building; finished attempts start over
                | (Quoted, Idle)
                | (NoRoute, Idle)
                | (Confirmed, Idle)
                | (Failed, Idle)
        )
    }

    /// Move to `next`, rejecting transitions the flow never takes
    pub fn advance(&mut self, next: SwapPhase) -> DexResult<()> {
        if !self.can_transition_to(next) {
            return Err(DexError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapPhase::NoRoute | SwapPhase::Confirmed | SwapPhase::Failed)
    }
}

impl std::fmt::Display for SwapPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SwapPhase::Idle => "idle",
            SwapPhase::Quoting => "quoting",
            SwapPhase::NoRoute => "no-route",
            SwapPhase::Quoted => "quoted",
            SwapPhase::Approving => "approving",
            SwapPhase::Submitting => "submitting",
            SwapPhase::Confirmed => "confirmed",
            SwapPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_with_approval() {
        let mut phase = SwapPhase::Idle;
        for next in [
            SwapPhase::Quoting,
            SwapPhase::Quoted,
            SwapPhase::Approving,
            SwapPhase::Submitting,
            SwapPhase::Confirmed,
        ] {
            phase.advance(next).unwrap();
        }
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_approval_is_optional() {
        let mut phase = SwapPhase::Quoted;
        phase.advance(SwapPhase::Submitting).unwrap();
        assert_eq!(phase, SwapPhase::Submitting);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut phase = SwapPhase::NoRoute;
        let err = phase.advance(SwapPhase::Submitting).unwrap_err();
        assert_eq!(
            err,
            DexError::InvalidTransition {
                from: "no-route".into(),
                to: "submitting".into(),
            }
        );
        assert_eq!(phase, SwapPhase::NoRoute);

        assert!(!SwapPhase::Idle.can_transition_to(SwapPhase::Submitting));
        assert!(!SwapPhase::Confirmed.can_transition_to(SwapPhase::Failed));
    }
}
