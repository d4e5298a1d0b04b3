//! Aggregator — totals and the plain-text balance report.
//!
//! Reduces a completed `ResultSet` into a `Report`. Pure: no I/O, and the
//! same result set always produces the same report.

use rust_decimal::Decimal;
use std::fmt;

use crate::types::{format_amount, BalancePair, ResultSet};

const RULE_WIDTH: usize = 50;

/// Placeholder written instead of amounts for unresolved addresses when
/// unresolved entries are marked.
pub const UNRESOLVED_MARKER: &str = "unresolved";

/// One address line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub address: String,
    /// `None` when the address could not be resolved.
    pub balance: Option<BalancePair>,
}

/// Summary of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<ReportLine>,
    pub total_native: Decimal,
    pub total_token: Decimal,
    /// Every address in the result set, resolved or not.
    pub processed: usize,
    pub funded_native: usize,
    pub funded_token: usize,
    pub unresolved: usize,
    /// Render unresolved lines with `UNRESOLVED_MARKER` instead of zeros.
    pub mark_unresolved: bool,
}

/// Summarize with unresolved addresses reported as zero balances.
pub fn summarize(results: &ResultSet) -> Report {
    summarize_with(results, false)
}

pub fn summarize_with(results: &ResultSet, mark_unresolved: bool) -> Report {
    let mut report = Report {
        lines: Vec::with_capacity(results.len()),
        total_native: Decimal::ZERO,
        total_token: Decimal::ZERO,
        processed: results.len(),
        funded_native: 0,
        funded_token: 0,
        unresolved: 0,
        mark_unresolved,
    };

    for (address, outcome) in results {
        match outcome {
            Some(pair) => {
                report.total_native += pair.native;
                report.total_token += pair.token;
                if pair.native > Decimal::ZERO {
                    report.funded_native += 1;
                }
                if pair.token > Decimal::ZERO {
                    report.funded_token += 1;
                }
            }
            None => report.unresolved += 1,
        }
        report.lines.push(ReportLine {
            address: address.clone(),
            balance: *outcome,
        });
    }

    report
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pair = self.balance.unwrap_or(BalancePair::ZERO);
        write!(
            f,
            "{} trx_balance {} Usdt_balance {}",
            self.address,
            format_amount(pair.native),
            format_amount(pair.token)
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);

        for line in &self.lines {
            if self.mark_unresolved && line.balance.is_none() {
                writeln!(
                    f,
                    "{} trx_balance {UNRESOLVED_MARKER} Usdt_balance {UNRESOLVED_MARKER}",
                    line.address
                )?;
            } else {
                writeln!(f, "{line}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total TRX Balance: {}", format_amount(self.total_native))?;
        writeln!(f, "Total USDT Balance: {}", format_amount(self.total_token))?;
        writeln!(f, "Total Addresses Processed: {}", self.processed)?;
        writeln!(f, "{rule}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
