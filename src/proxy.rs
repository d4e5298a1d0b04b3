//! Egress proxy pool.
//!
//! Proxies are loaded once per run from `host:port` or
//! `host:port:user:pass` lines and shared read-only between all tasks.
//! Every resolver attempt draws a fresh proxy uniformly at random, so a bad
//! proxy is never pinned to one address.

use anyhow::{anyhow, bail, Result};
use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// One egress proxy. A direct connection is represented by the absence of
/// a descriptor (`Option::None`), not by a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDescriptor {
    Open {
        host: String,
        port: u16,
    },
    Authenticated {
        host: String,
        port: u16,
        username: String,
        password: String,
    },
}

impl ProxyDescriptor {
    /// Proxy URL used for both http and https traffic.
    pub fn url(&self) -> String {
        match self {
            ProxyDescriptor::Open { host, port } => format!("http://{host}:{port}"),
            ProxyDescriptor::Authenticated {
                host,
                port,
                username,
                password,
            } => format!(
                "http://{}:{}@{host}:{port}",
                urlencoding::encode(username),
                urlencoding::encode(password)
            ),
        }
    }

    pub fn host(&self) -> &str {
        match self {
            ProxyDescriptor::Open { host, .. } | ProxyDescriptor::Authenticated { host, .. } => {
                host
            }
        }
    }
}

/// Never prints credentials.
impl fmt::Display for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyDescriptor::Open { host, port } => write!(f, "{host}:{port}"),
            ProxyDescriptor::Authenticated { host, port, .. } => {
                write!(f, "{host}:{port} (auth)")
            }
        }
    }
}

impl FromStr for ProxyDescriptor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let parse_port = |p: &str| {
            p.parse::<u16>()
                .map_err(|_| anyhow!("Invalid proxy port: {p}"))
        };

        match parts.as_slice() {
            [host, port] if !host.is_empty() => Ok(ProxyDescriptor::Open {
                host: host.to_string(),
                port: parse_port(port)?,
            }),
            [host, port, username, password] if !host.is_empty() => {
                Ok(ProxyDescriptor::Authenticated {
                    host: host.to_string(),
                    port: parse_port(port)?,
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            _ => bail!("Expected host:port or host:port:user:pass, got {} fields", parts.len()),
        }
    }
}

/// Immutable set of proxies for one run.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: Vec<ProxyDescriptor>,
}

impl ProxyPool {
    /// Parse a proxy list, one entry per line. Blank and malformed lines are
    /// skipped.
    pub fn from_lines(text: &str) -> Self {
        let proxies = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match line.parse::<ProxyDescriptor>() {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    debug!(error = %e, "Skipping proxy line");
                    None
                }
            })
            .collect();
        Self { proxies }
    }

    /// Pick a proxy uniformly at random, or `None` for a direct connection
    /// when the pool is empty.
    pub fn choose(&self) -> Option<&ProxyDescriptor> {
        self.proxies.choose(&mut rand::thread_rng())
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyDescriptor> {
        self.proxies.iter()
    }
}
