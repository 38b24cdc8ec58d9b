//! Router transaction construction
//!
//! Pure: validation, minimum output and deadline, then ABI encoding of
//! `exactInputSingle`. Nothing here touches the network.

use alloy_primitives::aliases::{U160, U24};
use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use tracing::debug;

use super::SwapRequest;
use crate::error::{DexError, DexResult};
use crate::slippage::{ensure_in_range, minimum_output};

/// Swaps may not stay valid for longer than this
pub const MAX_DEADLINE_SECS: u64 = 300;

sol! {
    /// Uniswap V3 SwapRouter
    #[derive(Debug)]
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params)
            external payable returns (uint256 amountOut);
    }
}

pub use ISwapRouter::ExactInputSingleParams;

/// A validated swap, ready to sign
#[derive(Debug, Clone)]
pub struct PreparedSwap {
    pub router: Address,
    pub params: ExactInputSingleParams,
    pub calldata: Bytes,
    pub minimum_output: U256,
    pub deadline: u64,
}

impl PreparedSwap {
    /// Unsigned transaction to the router
    pub fn transaction(&self, from: Address) -> TransactionRequest {
        TransactionRequest::default()
            .from(from)
            .to(self.router)
            .input(self.calldata.clone().into())
    }
}

/// Build the router call for `request` at unix time `now`
pub fn build_swap(request: &SwapRequest, router: Address, now: u64) -> DexResult<PreparedSwap> {
    if request.input_amount.is_zero() {
        return Err(DexError::InvalidAmount("input amount must be greater than zero".into()));
    }
    ensure_in_range(request.slippage_percent)?;

    let deadline = resolve_deadline(request.deadline, now)?;
    let minimum = minimum_output(request.expected_output, request.slippage_percent);

    let params = ExactInputSingleParams {
        tokenIn: request.input_token.address,
        tokenOut: request.output_token.address,
        fee: U24::from(request.fee.0),
        recipient: request.recipient,
        deadline: U256::from(deadline),
        amountIn: request.input_amount,
        amountOutMinimum: minimum,
        sqrtPriceLimitX96: U160::ZERO,
    };

    let calldata = ISwapRouter::exactInputSingleCall {
        params: params.clone(),
    }
    .abi_encode();

    debug!(
        "Built {} -> {} swap: in={} min_out={} fee={} deadline={}",
        request.input_token, request.output_token, request.input_amount, minimum, request.fee, deadline
    );

    Ok(PreparedSwap {
        router,
        params,
        calldata: calldata.into(),
        minimum_output: minimum,
        deadline,
    })
}

/// `build_swap` against the wall clock
pub fn prepare_swap(request: &SwapRequest, router: Address) -> DexResult<PreparedSwap> {
    build_swap(request, router, chrono::Utc::now().timestamp().max(0) as u64)
}

fn resolve_deadline(requested: Option<u64>, now: u64) -> DexResult<u64> {
    let latest = now + MAX_DEADLINE_SECS;
    match requested {
        None => Ok(latest),
        Some(deadline) if deadline > now && deadline <= latest => Ok(deadline),
        Some(deadline) => Err(DexError::InvalidDeadline {
            deadline,
            now,
            max_secs: MAX_DEADLINE_SECS,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::FeeTier;
    use crate::tokens::{USDC, WETH};

    const NOW: u64 = 1_700_000_000;

    fn request() -> SwapRequest {
        SwapRequest {
            input_token: WETH.for_chain(1),
            input_amount: U256::from(10u64).pow(U256::from(18u64)),
            output_token: USDC.for_chain(1),
            expected_output: U256::from(3_000_000_000u64),
            recipient: Address::repeat_byte(0xaa),
            fee: FeeTier::MEDIUM,
            slippage_percent: 0.5,
            deadline: None,
        }
    }

    fn router() -> Address {
        Address::repeat_byte(0xee)
    }

    #[test]
    fn test_builds_params_with_default_deadline() {
        let swap = build_swap(&request(), router(), NOW).unwrap();

        assert_eq!(swap.router, router());
        assert_eq!(swap.deadline, NOW + MAX_DEADLINE_SECS);
        assert_eq!(swap.params.deadline, U256::from(NOW + MAX_DEADLINE_SECS));
        assert_eq!(swap.params.fee, U24::from(3000u32));
        assert_eq!(swap.params.sqrtPriceLimitX96, U160::ZERO);
        // 0.5% below 3000 USDC
        assert_eq!(swap.minimum_output, U256::from(2_985_000_000u64));
        assert_eq!(swap.params.amountOutMinimum, swap.minimum_output);
    }

    #[test]
    fn test_wall_clock_deadline_within_bounds() {
        let before = chrono::Utc::now().timestamp() as u64;
        let swap = prepare_swap(&request(), router()).unwrap();
        let after = chrono::Utc::now().timestamp() as u64;

        assert!(swap.deadline > before);
        assert!(swap.deadline <= after + MAX_DEADLINE_SECS);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut req = request();
        req.input_amount = U256::ZERO;
        let err = build_swap(&req, router(), NOW).unwrap_err();
        assert!(matches!(err, DexError::InvalidAmount(_)));
    }

    #[test]
    fn test_out_of_range_slippage_rejected() {
        let mut req = request();
        req.slippage_percent = 51.0;
        assert_eq!(build_swap(&req, router(), NOW).unwrap_err(), DexError::InvalidSlippage(51.0));

        req.slippage_percent = 0.0;
        assert!(build_swap(&req, router(), NOW).is_err());
    }

    #[test]
    fn test_caller_deadline_bounds() {
        let mut req = request();

        req.deadline = Some(NOW + 60);
        assert_eq!(build_swap(&req, router(), NOW).unwrap().deadline, NOW + 60);

        req.deadline = Some(NOW);
        assert!(matches!(
            build_swap(&req, router(), NOW).unwrap_err(),
            DexError::InvalidDeadline { .. }
        ));

        req.deadline = Some(NOW + MAX_DEADLINE_SECS + 1);
        assert!(build_swap(&req, router(), NOW).is_err());
    }

    #[test]
    fn test_calldata_round_trips_through_router_abi() {
        let swap = build_swap(&request(), router(), NOW).unwrap();

        assert_eq!(&swap.calldata[..4], &ISwapRouter::exactInputSingleCall::SELECTOR);
        // exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))
        assert_eq!(hex::encode(&swap.calldata[..4]), "414bf389");

        let decoded = ISwapRouter::exactInputSingleCall::abi_decode(&swap.calldata).unwrap();
        assert_eq!(decoded.params.tokenIn, WETH.for_chain(1).address);
        assert_eq!(decoded.params.amountOutMinimum, swap.minimum_output);
    }

    #[test]
    fn test_transaction_targets_router() {
        let swap = build_swap(&request(), router(), NOW).unwrap();
        let tx = swap.transaction(Address::repeat_byte(0xaa));
        assert_eq!(tx.from, Some(Address::repeat_byte(0xaa)));
        assert_eq!(tx.input.input().map(|b| b.len()), Some(swap.calldata.len()));
    }
}
