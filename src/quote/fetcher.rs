//! Best-pool quote selection
//!
//! Every pool of the pair is simulated concurrently. A failed simulation
//! contributes zero and is never propagated; only "every pool is zero"
//! becomes `DexError::NoRoute`.

use alloy_primitives::U256;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    FeeTier, PairKey, PoolCache, PoolInfo, PoolSource, Quote, QuoteRequest, QuoteSimulator,
    SimulationFailure,
};
use crate::error::{DexError, DexResult};

/// Highest output and its fee tier. Ties go to the first pool.
/// `None` when the list is empty or every output is zero.
pub fn select_best(outcomes: &[(FeeTier, U256)]) -> Option<(usize, FeeTier, U256)> {
    let mut best: Option<(usize, FeeTier, U256)> = None;

    for (idx, (fee, amount_out)) in outcomes.iter().enumerate() {
        match best {
            Some((_, _, best_out)) if *amount_out <= best_out => {}
            _ => best = Some((idx, *fee, *amount_out)),
        }
    }

    best.filter(|(_, _, amount_out)| !amount_out.is_zero())
}

pub struct QuoteFetcher {
    pools: Arc<dyn PoolSource>,
    simulator: Arc<dyn QuoteSimulator>,
    cache: PoolCache,
}

impl QuoteFetcher {
    pub fn new(
        pools: Arc<dyn PoolSource>,
        simulator: Arc<dyn QuoteSimulator>,
        cache: PoolCache,
    ) -> Self {
        Self {
            pools,
            simulator,
            cache,
        }
    }

    pub fn cache(&self) -> &PoolCache {
        &self.cache
    }

    /// Pools for the ordered pair, from cache or the factory
    pub async fn pools_for(&self, key: PairKey) -> eyre::Result<Vec<PoolInfo>> {
        if let Some(pools) = self.cache.get(&key).await {
            return Ok(pools);
        }

        let pools = self.pools.pools(key.token_in, key.token_out).await?;
        debug!("Discovered {} pools for {}", pools.len(), key);
        self.cache.insert(key, pools.clone()).await;

        Ok(pools)
    }

    /// Best quote across every pool of the pair
    pub async fn fetch_quote(&self, request: &QuoteRequest) -> eyre::Result<Quote> {
        if request.amount_in.is_zero() {
            return Err(DexError::InvalidAmount("input amount must be greater than 0".into()).into());
        }

        let token_in = request.token_in.address;
        let token_out = request.token_out.address;
        let no_route = || DexError::NoRoute { token_in, token_out };

        let pools = self.pools_for(PairKey::new(token_in, token_out)).await?;
        if pools.is_empty() {
            warn!("No pools for {} -> {}", request.token_in, request.token_out);
            return Err(no_route().into());
        }

        let simulations = pools.iter().map(|pool| {
            self.simulator
                .simulate(token_in, token_out, request.amount_in, pool.fee)
        });
        let results = join_all(simulations).await;

        let mut failed_simulations = 0;
        let outcomes: Vec<(FeeTier, U256)> = pools
            .iter()
            .zip(results)
            .map(|(pool, result)| match result {
                Ok(amount_out) => (pool.fee, amount_out),
                Err(failure) => {
                    failed_simulations += 1;
                    log_failure(pool, &failure);
                    (pool.fee, U256::ZERO)
                }
            })
            .collect();

        let (idx, fee, amount_out) = select_best(&outcomes).ok_or_else(no_route)?;

        info!(
            "Best quote {} {} -> {} out via {} pool ({} pools, {} failed)",
            request.amount_in,
            request.token_in,
            amount_out,
            fee,
            pools.len(),
            failed_simulations
        );

        Ok(Quote {
            amount_in: request.amount_in,
            amount_out,
            fee,
            pool: pools[idx].address,
            pools_considered: pools.len(),
            failed_simulations,
        })
    }

    /// Same as `fetch_quote` with the error narrowed to `DexError` when it is one
    pub async fn quote(&self, request: &QuoteRequest) -> DexResult<Quote> {
        self.fetch_quote(request).await.map_err(|report| {
            match report.downcast::<DexError>() {
                Ok(dex) => dex,
                Err(other) => DexError::Rpc(other.to_string()),
            }
        })
    }
}

fn log_failure(pool: &PoolInfo, failure: &SimulationFailure) {
    match failure {
        SimulationFailure::Reverted(_) => {
            debug!("Pool {:?} ({}) {}", pool.address, pool.fee, failure)
        }
        SimulationFailure::Transport(_) | SimulationFailure::TimedOut => {
            warn!("Pool {:?} ({}) {}", pool.address, pool.fee, failure)
        }
    }
}
