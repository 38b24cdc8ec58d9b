//! Pool list cache
//!
//! Keyed by the ORDERED (token_in, token_out) pair. Entries expire after a
//! TTL and can be dropped by hand; an entry is replaced whole, never edited.

use alloy_primitives::Address;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::trace;

use super::PoolInfo;

/// Pool deployments change rarely; ten minutes keeps lookups cheap
pub const DEFAULT_POOL_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub token_in: Address,
    pub token_out: Address,
}

impl PairKey {
    pub fn new(token_in: Address, token_out: Address) -> Self {
        Self { token_in, token_out }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{:?}", self.token_in, self.token_out)
    }
}

#[derive(Debug, Clone)]
struct CachedPools {
    pools: Vec<PoolInfo>,
    fetched_at: Instant,
}

pub struct PoolCache {
    ttl: Duration,
    entries: RwLock<HashMap<PairKey, CachedPools>>,
}

impl PoolCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for a pair, if any
    pub async fn get(&self, key: &PairKey) -> Option<Vec<PoolInfo>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(cached) if cached.fetched_at.elapsed() <= self.ttl => {
                trace!("Pool cache hit for {}", key);
                Some(cached.pools.clone())
            }
            _ => None,
        }
    }

    pub async fn insert(&self, key: PairKey, pools: Vec<PoolInfo>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CachedPools {
                pools,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, key: &PairKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drop expired entries, returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, cached| cached.fetched_at.elapsed() <= ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for PoolCache {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::FeeTier;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn pools() -> Vec<PoolInfo> {
        vec![PoolInfo { address: addr(9), fee: FeeTier::MEDIUM }]
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = PoolCache::default();
        let key = PairKey::new(addr(1), addr(2));

        assert!(cache.get(&key).await.is_none());
        cache.insert(key, pools()).await;
        assert_eq!(cache.get(&key).await, Some(pools()));
    }

    #[test]
    fn test_key_is_ordered() {
        tokio_test::block_on(async {
            let cache = PoolCache::default();
            cache.insert(PairKey::new(addr(1), addr(2)), pools()).await;

            assert!(cache.get(&PairKey::new(addr(2), addr(1))).await.is_none());
        });
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let cache = PoolCache::new(Duration::ZERO);
        let key = PairKey::new(addr(1), addr(2));
        cache.insert(key, pools()).await;

        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = PoolCache::default();
        let a = PairKey::new(addr(1), addr(2));
        let b = PairKey::new(addr(3), addr(4));
        cache.insert(a, pools()).await;
        cache.insert(b, pools()).await;

        assert!(cache.invalidate(&a).await);
        assert!(!cache.invalidate(&a).await);
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
