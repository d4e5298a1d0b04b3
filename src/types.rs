//! Shared types for the balance sweeper.
//!
//! These types form the data model used across all modules. The explorer,
//! engine, and storage layers depend on them without depending on each
//! other.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Decimal places between raw TRX units (sun) and whole TRX.
pub const NATIVE_DECIMALS: u32 = 6;

/// Decimal places assumed for a token when the provider gives no hint.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 6;

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Native (TRX) and stablecoin balances of one address, in human units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalancePair {
    pub native: Decimal,
    pub token: Decimal,
}

impl BalancePair {
    /// A resolved address holding nothing.
    pub const ZERO: BalancePair = BalancePair {
        native: Decimal::ZERO,
        token: Decimal::ZERO,
    };

    pub fn new(native: Decimal, token: Decimal) -> Self {
        Self { native, token }
    }

    /// Whether both balances are zero.
    pub fn is_empty(&self) -> bool {
        self.native.is_zero() && self.token.is_zero()
    }
}

impl fmt::Display for BalancePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TRX: {} | USDT: {}",
            format_amount(self.native),
            format_amount(self.token),
        )
    }
}

/// Per-address outcome of a run. `None` marks an address that could not be
/// resolved after all retries; `Some(BalancePair::ZERO)` is a resolved,
/// empty wallet.
///
/// Ordered by address so that anything rendered from it is deterministic.
pub type ResultSet = BTreeMap<String, Option<BalancePair>>;

/// Render an amount without trailing zeros (`1.500000` → `1.5`).
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures while talking to an explorer or interpreting its responses.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    #[error("Transport error ({url}): {message}")]
    Transport { url: String, message: String },

    #[error("Decode error ({source_name}): {message}")]
    Decode { source_name: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl BalanceError {
    pub fn transport(url: impl Into<String>, message: impl fmt::Display) -> Self {
        BalanceError::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        BalanceError::Decode {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BalanceError::NotFound(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
