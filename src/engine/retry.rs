//! Retry coordinator.
//!
//! Wraps the resolver with a bounded number of attempts. Each attempt draws
//! a fresh proxy from the pool, and attempts are separated by a fixed pause.
//! Errors never escape: an address that fails every attempt comes back as
//! unresolved (or as a zero pair through `fetch_with_retry`).

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::explorer::resolver::BalanceResolver;
use crate::http::TransportFactory;
use crate::proxy::ProxyPool;
use crate::types::{format_amount, BalancePair};

/// How hard to try before giving up on an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total resolver attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

pub struct RetryCoordinator {
    resolver: Arc<dyn BalanceResolver>,
    transports: Arc<dyn TransportFactory>,
    proxies: Arc<ProxyPool>,
    policy: RetryPolicy,
}

impl RetryCoordinator {
    pub fn new(
        resolver: Arc<dyn BalanceResolver>,
        transports: Arc<dyn TransportFactory>,
        proxies: Arc<ProxyPool>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            resolver,
            transports,
            proxies,
            policy,
        }
    }

    /// Balances for `address`, or a zero pair once every attempt failed.
    pub async fn fetch_with_retry(&self, address: &str) -> BalancePair {
        self.fetch_outcome(address).await.unwrap_or(BalancePair::ZERO)
    }

    /// Balances for `address`, or `None` once every attempt failed.
    pub async fn fetch_outcome(&self, address: &str) -> Option<BalancePair> {
        // One transport per task, reused across its attempts.
        let http = match self.transports.create() {
            Ok(http) => http,
            Err(e) => {
                error!(address, error = %e, "Could not create HTTP transport");
                return None;
            }
        };

        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let proxy = self.proxies.choose();
            let via = proxy.map(ToString::to_string).unwrap_or_else(|| "direct".to_string());

            if attempt == 1 {
                info!(address, attempt, via = %via, "Checking address");
            } else {
                info!(address, attempt, via = %via, "Retrying address");
            }

            match self.resolver.resolve(address, &*http, proxy).await {
                Ok(pair) => {
                    if pair.is_empty() {
                        info!(address, "Empty wallet");
                    } else {
                        info!(
                            address,
                            trx = %format_amount(pair.native),
                            usdt = %format_amount(pair.token),
                            "Funded wallet"
                        );
                    }
                    return Some(pair);
                }
                Err(e) => {
                    warn!(address, attempt, via = %via, error = %e, "Balance lookup failed");
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        error!(address, attempts, "Failed to get balance after all attempts");
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpTransport, MockTransportFactory};
    use crate::proxy::ProxyDescriptor;
    use crate::types::BalanceError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    struct NullTransport;

    #[async_trait]
    impl HttpTransport for NullTransport {
        async fn get_json(
            &self,
            url: &str,
            _proxy: Option<&ProxyDescriptor>,
        ) -> Result<Value, BalanceError> {
            Err(BalanceError::transport(url, "offline"))
        }
    }

    /// Fails the first `failures` calls, then returns `pair`. Records the
    /// proxy host seen by every attempt.
    struct FlakyResolver {
        failures: u32,
        pair: BalancePair,
        calls: AtomicU32,
        proxies_seen: Mutex<Vec<Option<String>>>,
    }

    impl FlakyResolver {
        fn new(failures: u32, pair: BalancePair) -> Self {
            Self {
                failures,
                pair,
                calls: AtomicU32::new(0),
                proxies_seen: Mutex::new(Vec::new()),
            }
        }

        fn always_failing() -> Self {
            Self::new(u32::MAX, BalancePair::ZERO)
        }
    }

    #[async_trait]
    impl BalanceResolver for FlakyResolver {
        async fn resolve(
            &self,
            address: &str,
            _http: &dyn HttpTransport,
            proxy: Option<&ProxyDescriptor>,
        ) -> Result<BalancePair, BalanceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.proxies_seen
                .lock()
                .unwrap()
                .push(proxy.map(|p| p.host().to_string()));
            if n < self.failures {
                Err(BalanceError::transport(address, "proxy refused connection"))
            } else {
                Ok(self.pair)
            }
        }
    }

    fn factory() -> Arc<dyn TransportFactory> {
        let mut factory = MockTransportFactory::new();
        factory
            .expect_create()
            .returning(|| Ok(Box::new(NullTransport) as Box<dyn HttpTransport>));
        Arc::new(factory)
    }

    fn coordinator(
        resolver: Arc<FlakyResolver>,
        proxies: ProxyPool,
        max_attempts: u32,
        backoff_ms: u64,
    ) -> RetryCoordinator {
        RetryCoordinator::new(
            resolver,
            factory(),
            Arc::new(proxies),
            RetryPolicy {
                max_attempts,
                backoff: Duration::from_millis(backoff_ms),
            },
        )
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let resolver = Arc::new(FlakyResolver::new(0, BalancePair::new(dec!(5), dec!(1.5))));
        let c = coordinator(resolver.clone(), ProxyPool::default(), 3, 0);

        let pair = c.fetch_with_retry("TAddr").await;

        assert_eq!(pair, BalancePair::new(dec!(5), dec!(1.5)));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let resolver = Arc::new(FlakyResolver::new(2, BalancePair::new(dec!(1), dec!(0))));
        let c = coordinator(resolver.clone(), ProxyPool::default(), 3, 1);

        let outcome = c.fetch_outcome("TAddr").await;

        assert_eq!(outcome, Some(BalancePair::new(dec!(1), dec!(0))));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_zero_after_max_attempts() {
        let resolver = Arc::new(FlakyResolver::always_failing());
        let c = coordinator(resolver.clone(), ProxyPool::default(), 3, 25);

        let started = Instant::now();
        let pair = c.fetch_with_retry("TAddr").await;
        let elapsed = started.elapsed();

        assert_eq!(pair, BalancePair::ZERO);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
        // Two pauses separate three attempts.
        assert!(elapsed >= Duration::from_millis(50), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_exhaustion_outcome_is_unresolved() {
        let resolver = Arc::new(FlakyResolver::always_failing());
        let c = coordinator(resolver, ProxyPool::default(), 2, 0);
        assert_eq!(c.fetch_outcome("TAddr").await, None);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let resolver = Arc::new(FlakyResolver::always_failing());
        let c = coordinator(resolver.clone(), ProxyPool::default(), 0, 0);
        c.fetch_with_retry("TAddr").await;
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_direct_connection_without_proxies() {
        let resolver = Arc::new(FlakyResolver::always_failing());
        let c = coordinator(resolver.clone(), ProxyPool::default(), 3, 0);
        c.fetch_with_retry("TAddr").await;
        let seen = resolver.proxies_seen.lock().unwrap().clone();
        assert_eq!(seen, vec![None, None, None]);
    }

    #[tokio::test]
    async fn test_fresh_proxy_each_attempt() {
        let resolver = Arc::new(FlakyResolver::always_failing());
        let pool = ProxyPool::from_lines("alpha:8080\nbravo:8080:user:pass");
        let c = coordinator(resolver.clone(), pool, 64, 0);

        c.fetch_with_retry("TAddr").await;

        let seen = resolver.proxies_seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 64);
        assert!(seen.iter().all(|p| matches!(p.as_deref(), Some("alpha") | Some("bravo"))));
        assert!(seen.iter().any(|p| p.as_deref() == Some("alpha")));
        assert!(seen.iter().any(|p| p.as_deref() == Some("bravo")));
    }

    #[tokio::test]
    async fn test_transport_creation_failure_is_unresolved() {
        let mut factory = MockTransportFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(|| Err(BalanceError::transport("client", "TLS backend unavailable")));
        let resolver = Arc::new(FlakyResolver::new(0, BalancePair::new(dec!(1), dec!(1))));
        let c = RetryCoordinator::new(
            resolver.clone(),
            Arc::new(factory),
            Arc::new(ProxyPool::default()),
            RetryPolicy::default(),
        );

        assert_eq!(c.fetch_outcome("TAddr").await, None);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(1));
    }
}
