//! A time-bounded memo of address-to-chain resolution.
use core::time::Duration;
use std::collections::HashMap;

use astral_types::chain::{AssetInfo, ChainInfo};
use astral_types::identifiers::ChainId;
use astral_types::validate::bech32_prefix;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::config::TransferConfig;
use crate::context::NetworkDirectory;

/// Wraps a [`NetworkDirectory`], remembering `chain_for_address` results per
/// bech32 prefix for `ttl`.
pub struct CachedDirectory<D> {
    inner: D,
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Option<ChainInfo>)>>,
}

impl<D: NetworkDirectory> CachedDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Caches for the configured `address_cache_ttl_secs`.
    pub fn from_config(inner: D, config: &TransferConfig) -> Self {
        Self::new(inner, config.address_cache_ttl())
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }
}

impl<D: NetworkDirectory> NetworkDirectory for CachedDirectory<D> {
    fn chain_for_address(&self, address: &str) -> Option<ChainInfo> {
        let Some(prefix) = bech32_prefix(address) else {
            return self.inner.chain_for_address(address);
        };

        let now = Instant::now();
        if let Some((resolved_at, chain)) = self.entries.lock().get(&prefix) {
            if now.duration_since(*resolved_at) < self.ttl {
                trace!(%prefix, "address resolution cache hit");
                return chain.clone();
            }
        }

        let chain = self.inner.chain_for_address(address);
        self.entries.lock().insert(prefix, (now, chain.clone()));
        chain
    }

    fn chain_by_id(&self, chain_id: &ChainId) -> Option<ChainInfo> {
        self.inner.chain_by_id(chain_id)
    }

    fn assets_for_chain(&self, chain_id: &ChainId) -> Option<AssetInfo> {
        self.inner.assets_for_chain(chain_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::topology::tests::StaticDirectory;

    #[derive(Default)]
    struct CountingDirectory(AtomicUsize);

    impl NetworkDirectory for CountingDirectory {
        fn chain_for_address(&self, address: &str) -> Option<ChainInfo> {
            self.0.fetch_add(1, Ordering::SeqCst);
            StaticDirectory.chain_for_address(address)
        }

        fn chain_by_id(&self, chain_id: &ChainId) -> Option<ChainInfo> {
            StaticDirectory.chain_by_id(chain_id)
        }

        fn assets_for_chain(&self, chain_id: &ChainId) -> Option<AssetInfo> {
            StaticDirectory.assets_for_chain(chain_id)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolutions_expire_after_ttl() {
        let cache = CachedDirectory::new(CountingDirectory::default(), Duration::from_secs(300));
        let first = "juno1qyqszqgpqyqszqgpqyqszqgpqyqszqgpypz92q";
        let second = "juno1qgpqyqszqgpqyqszqgpqyqszqgpqyqsz49yqpk";

        let chain = cache.chain_for_address(first).unwrap();
        assert_eq!(chain.chain_id.as_str(), "juno-1");
        assert_eq!(cache.chain_for_address(second), Some(chain));
        assert_eq!(cache.inner().0.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.chain_for_address(first).is_some());
        assert_eq!(cache.inner().0.load(Ordering::SeqCst), 2);

        cache.invalidate();
        assert!(cache.chain_for_address(first).is_some());
        assert_eq!(cache.inner().0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_comes_from_config() {
        let config = TransferConfig::from_json(r#"{"address_cache_ttl_secs": 5}"#).unwrap();
        let cache = CachedDirectory::from_config(CountingDirectory::default(), &config);
        let address = "juno1qyqszqgpqyqszqgpqyqszqgpqyqszqgpypz92q";

        assert!(cache.chain_for_address(address).is_some());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.chain_for_address(address).is_some());
        assert_eq!(cache.inner().0.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.chain_for_address(address).is_some());
        assert_eq!(cache.inner().0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_undecodable_addresses_bypass_the_cache() {
        let cache = CachedDirectory::new(CountingDirectory::default(), Duration::from_secs(300));
        assert_eq!(cache.chain_for_address("not-an-address"), None);
        assert_eq!(cache.chain_for_address("not-an-address"), None);
        assert_eq!(cache.inner().0.load(Ordering::SeqCst), 2);
    }
}
