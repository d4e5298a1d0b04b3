//! Block explorer integrations.
//!
//! - `token` — target token, the balance parse rule, and token matching
//! - `trongrid` — TronGrid account summary and TRC-20 list responses
//! - `tronscan` — Tronscan token list responses (secondary provider)
//! - `resolver` — the fallback chain that turns these into one `BalancePair`

pub mod resolver;
pub mod token;
pub mod trongrid;
pub mod tronscan;

/// Base URLs of the explorers consulted by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    trongrid: String,
    tronscan: String,
}

impl Endpoints {
    pub fn new(trongrid: &str, tronscan: &str) -> Self {
        Self {
            trongrid: trongrid.trim_end_matches('/').to_string(),
            tronscan: tronscan.trim_end_matches('/').to_string(),
        }
    }

    /// Account summary (native balance plus inline TRC-20 balances).
    pub fn account(&self, address: &str) -> String {
        format!("{}/v1/accounts/{}", self.trongrid, urlencoding::encode(address))
    }

    /// TronGrid TRC-20 token list for one account.
    pub fn trc20(&self, address: &str) -> String {
        format!("{}/v1/accounts/{}/trc20", self.trongrid, urlencoding::encode(address))
    }

    /// Tronscan token list for one account.
    pub fn tronscan_tokens(&self, address: &str) -> String {
        format!(
            "{}/api/account/tokens?address={}&token=trc20",
            self.tronscan,
            urlencoding::encode(address)
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new("https://api.trongrid.io", "https://apilist.tronscanapi.com")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let e = Endpoints::default();
        assert_eq!(e.account("TAbc"), "https://api.trongrid.io/v1/accounts/TAbc");
        assert_eq!(e.trc20("TAbc"), "https://api.trongrid.io/v1/accounts/TAbc/trc20");
        assert_eq!(
            e.tronscan_tokens("TAbc"),
            "https://apilist.tronscanapi.com/api/account/tokens?address=TAbc&token=trc20"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let e = Endpoints::new("http://localhost:9000/", "http://localhost:9001//");
        assert_eq!(e.account("T1"), "http://localhost:9000/v1/accounts/T1");
        assert!(e.tronscan_tokens("T1").starts_with("http://localhost:9001/api/"));
    }

    #[test]
    fn test_address_is_encoded() {
        let e = Endpoints::default();
        assert_eq!(
            e.account("not an/address"),
            "https://api.trongrid.io/v1/accounts/not%20an%2Faddress"
        );
    }
}
