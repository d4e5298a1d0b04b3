//! File inputs and the report output.
//!
//! Reads the address list and the proxy list (one entry per line) and writes
//! the rendered balance report. All paths come from the `[files]` config
//! section.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::engine::aggregator::Report;
use crate::proxy::ProxyPool;

/// Load addresses, one per line. Lines are trimmed and blank lines skipped.
pub fn load_addresses(path: &str) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read address file {path}"))?;

    let addresses: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    info!(path, count = addresses.len(), "Addresses loaded");
    Ok(addresses)
}

/// Load the proxy pool. A missing file yields an empty pool, so every
/// request goes out directly.
pub fn load_proxies(path: &str) -> Result<ProxyPool> {
    if !Path::new(path).exists() {
        warn!(path, "Proxy file not found, connecting directly");
        return Ok(ProxyPool::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read proxy file {path}"))?;
    let pool = ProxyPool::from_lines(&text);

    if pool.is_empty() {
        warn!(path, "Proxy file has no usable entries, connecting directly");
    } else {
        info!(path, count = pool.len(), "Proxies loaded");
    }
    Ok(pool)
}

/// Write the rendered report, replacing any previous one.
pub fn save_report(report: &Report, path: &str) -> Result<()> {
    std::fs::write(path, report.to_string())
        .with_context(|| format!("Failed to write report to {path}"))?;

    debug!(path, lines = report.lines.len(), "Report saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregator::summarize;
    use crate::types::{BalancePair, ResultSet};
    use rust_decimal_macros::dec;

    fn temp_path(stem: &str) -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("tron_balances_test_{stem}_{}.txt", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_load_addresses_trims_and_skips_blanks() {
        let path = temp_path("addresses");
        std::fs::write(&path, "  TAddrOne  \n\n\t\nTAddrTwo\r\nTAddrThree").unwrap();

        let addresses = load_addresses(&path).unwrap();

        assert_eq!(addresses, vec!["TAddrOne", "TAddrTwo", "TAddrThree"]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_addresses_missing_file_is_error() {
        let err = load_addresses("/tmp/tron_balances_no_such_addresses.txt").unwrap_err();
        assert!(err.to_string().contains("Failed to read address file"));
    }

    #[test]
    fn test_load_proxies() {
        let path = temp_path("proxies");
        std::fs::write(&path, "10.0.0.1:3128\n\nnot-a-proxy\n10.0.0.2:8080:user:secret\n").unwrap();

        let pool = load_proxies(&path).unwrap();

        assert_eq!(pool.len(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_proxies_missing_file_is_empty_pool() {
        let pool = load_proxies("/tmp/tron_balances_no_such_proxies.txt").unwrap();
        assert!(pool.is_empty());
        assert!(pool.choose().is_none());
    }

    #[test]
    fn test_save_report_writes_rendered_text() {
        let path = temp_path("report");
        let mut results = ResultSet::new();
        results.insert("TAddr".into(), Some(BalancePair::new(dec!(10), dec!(0.25))));
        let report = summarize(&results);

        save_report(&report, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.to_string());
        assert!(written.starts_with("TAddr trx_balance 10 Usdt_balance 0.25\n"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_report_overwrites() {
        let path = temp_path("overwrite");
        std::fs::write(&path, "stale contents from an earlier run\n").unwrap();

        save_report(&summarize(&ResultSet::new()), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        assert!(written.contains("Total Addresses Processed: 0"));
        std::fs::remove_file(&path).unwrap();
    }
}
