//! Balance resolver: the layered fallback chain.
//!
//! 1. TronGrid account summary → native balance + inline TRC-20 balances.
//! 2. TronGrid TRC-20 list, if the inline lookup found no token balance.
//! 3. Tronscan token list, if still nothing.
//!
//! Only step 1 can fail the resolution. Steps 2–3 degrade to "found
//! nothing" on any transport or shape problem.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use super::token::{TokenList, TokenTarget};
use super::{trongrid, tronscan, Endpoints};
use crate::http::HttpTransport;
use crate::proxy::ProxyDescriptor;
use crate::types::{BalanceError, BalancePair};

/// Resolves one address into a `BalancePair`.
#[async_trait]
pub trait BalanceResolver: Send + Sync {
    async fn resolve(
        &self,
        address: &str,
        http: &dyn HttpTransport,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<BalancePair, BalanceError>;
}

/// Token-list sources consulted after the account summary, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackSource {
    TronGridTokens,
    Tronscan,
}

impl FallbackSource {
    const CHAIN: [FallbackSource; 2] = [FallbackSource::TronGridTokens, FallbackSource::Tronscan];

    fn name(self) -> &'static str {
        match self {
            FallbackSource::TronGridTokens => "trongrid-trc20",
            FallbackSource::Tronscan => "tronscan",
        }
    }

    fn url(self, endpoints: &Endpoints, address: &str) -> String {
        match self {
            FallbackSource::TronGridTokens => endpoints.trc20(address),
            FallbackSource::Tronscan => endpoints.tronscan_tokens(address),
        }
    }

    fn entries(self, body: &Value) -> TokenList<'_> {
        match self {
            FallbackSource::TronGridTokens => trongrid::token_list(body),
            FallbackSource::Tronscan => tronscan::token_list(body),
        }
    }
}

/// Resolver backed by the TronGrid and Tronscan explorers.
#[derive(Debug, Clone)]
pub struct ExplorerResolver {
    endpoints: Endpoints,
    target: TokenTarget,
}

impl ExplorerResolver {
    pub fn new(endpoints: Endpoints, target: TokenTarget) -> Self {
        Self { endpoints, target }
    }

    /// Ask one fallback source for the token balance. Every failure is
    /// reported as zero.
    async fn lookup_fallback(
        &self,
        source: FallbackSource,
        address: &str,
        http: &dyn HttpTransport,
        proxy: Option<&ProxyDescriptor>,
    ) -> Decimal {
        let url = source.url(&self.endpoints, address);
        let body = match http.get_json(&url, proxy).await {
            Ok(body) => body,
            Err(e) => {
                debug!(address, source = source.name(), error = %e, "Fallback source unavailable");
                return Decimal::ZERO;
            }
        };

        let list = source.entries(&body);
        match list.find_amount(&self.target) {
            Some(amount) => {
                debug!(address, source = source.name(), amount = %amount, "Token entry matched");
                amount
            }
            None => {
                debug!(address, source = source.name(), entries = list.len(), "No matching token entry");
                Decimal::ZERO
            }
        }
    }
}

#[async_trait]
impl BalanceResolver for ExplorerResolver {
    async fn resolve(
        &self,
        address: &str,
        http: &dyn HttpTransport,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<BalancePair, BalanceError> {
        let summary = match http.get_json(&self.endpoints.account(address), proxy).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                debug!(address, "Account not found, treating as empty");
                return Ok(BalancePair::ZERO);
            }
            Err(e) => return Err(e),
        };

        let account = match trongrid::parse_account(&summary)? {
            trongrid::AccountSummary::Account(account) => account,
            trongrid::AccountSummary::Empty => return Ok(BalancePair::ZERO),
        };

        let native = trongrid::native_balance(account)?;
        let mut token = trongrid::inline_token_balance(account, &self.target);

        for source in FallbackSource::CHAIN {
            if !token.is_zero() {
                break;
            }
            token = self.lookup_fallback(source, address, http, proxy).await;
        }

        Ok(BalancePair::new(native, token))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
