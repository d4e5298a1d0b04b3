//! HTTP transport.
//!
//! The resolver only needs "GET this URL as JSON, optionally through this
//! proxy". `HttpTransport` is that capability. `ReqwestTransport` is the
//! production implementation: per-call timeout plus bounded retry on
//! throttling and server errors.
//!
//! One transport is created per address task through a `TransportFactory`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::proxy::ProxyDescriptor;
use crate::types::BalanceError;

/// Header carrying the TronGrid API key.
const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// Status codes worth asking again for.
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Opaque JSON-over-HTTP capability used by the balance resolver.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and decode the body as JSON. A `None` proxy means a direct
    /// connection.
    async fn get_json(
        &self,
        url: &str,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<Value, BalanceError>;
}

/// Produces a fresh transport for each address task.
#[cfg_attr(test, mockall::automock)]
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn HttpTransport>, BalanceError>;
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Everything needed to build a `ReqwestTransport`.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub status_retries: u32,
    pub status_backoff: Duration,
    pub user_agent: String,
    pub api_key: Option<SecretString>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            status_retries: 3,
            status_backoff: Duration::from_secs(1),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            api_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

pub struct ReqwestTransport {
    settings: HttpSettings,
    headers: HeaderMap,
    /// Client for direct connections. Proxied calls build their own client,
    /// since reqwest binds proxies at build time.
    direct: Client,
}

impl ReqwestTransport {
    pub fn new(settings: HttpSettings) -> Result<Self, BalanceError> {
        let headers = Self::default_headers(&settings)?;
        let direct = Self::build_client(&settings, &headers, None)?;
        Ok(Self {
            settings,
            headers,
            direct,
        })
    }

    fn default_headers(settings: &HttpSettings) -> Result<HeaderMap, BalanceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = &settings.api_key {
            let mut value = HeaderValue::from_str(key.expose_secret())
                .map_err(|e| BalanceError::transport(API_KEY_HEADER, e))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        Ok(headers)
    }

    fn build_client(
        settings: &HttpSettings,
        headers: &HeaderMap,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<Client, BalanceError> {
        let builder = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers.clone());

        let builder = match proxy {
            Some(p) => {
                let proxy = reqwest::Proxy::all(p.url())
                    .map_err(|e| BalanceError::transport(p.to_string(), e))?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| BalanceError::transport("client", format!("Failed to build HTTP client: {e}")))
    }

    fn client_for(&self, proxy: Option<&ProxyDescriptor>) -> Result<Client, BalanceError> {
        match proxy {
            None => Ok(self.direct.clone()),
            Some(_) => Self::build_client(&self.settings, &self.headers, proxy),
        }
    }

    fn is_retryable(status: StatusCode) -> bool {
        RETRYABLE_STATUSES.contains(&status.as_u16())
    }

    /// Exponential delay before status retry number `retry` (1-based).
    fn status_delay(&self, retry: u32) -> Duration {
        self.settings.status_backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(
        &self,
        url: &str,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<Value, BalanceError> {
        let client = self.client_for(proxy)?;

        for attempt in 0..=self.settings.status_retries {
            if attempt > 0 {
                let delay = self.status_delay(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, url, "Retrying request");
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .get(url)
                .send()
                .await
                .map_err(|e| BalanceError::transport(url, e))?;

            let status = resp.status();

            if status.is_success() {
                return resp
                    .json::<Value>()
                    .await
                    .map_err(|e| BalanceError::decode(url, e));
            }

            if status == StatusCode::NOT_FOUND {
                return Err(BalanceError::NotFound(url.to_string()));
            }

            if Self::is_retryable(status) && attempt < self.settings.status_retries {
                warn!(status = %status, attempt, url, "Retryable explorer status");
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(BalanceError::transport(url, format!("HTTP {status}: {body}")));
        }

        Err(BalanceError::transport(url, "status retries exhausted"))
    }
}

/// Builds one `ReqwestTransport` per task from shared settings.
#[derive(Debug, Clone)]
pub struct ReqwestTransportFactory {
    settings: HttpSettings,
}

impl ReqwestTransportFactory {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn create(&self) -> Result<Box<dyn HttpTransport>, BalanceError> {
        Ok(Box::new(ReqwestTransport::new(self.settings.clone())?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
