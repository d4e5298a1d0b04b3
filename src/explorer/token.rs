//! Token matching and balance parsing.
//!
//! Explorers disagree on how a token entry looks: the contract may sit in
//! `contract_address`, `contractAddress`, `tokenId`, or a nested
//! `token_info.address`; some entries are a bare `{ "<contract>": "<raw>" }`
//! map; balances come as numbers, raw-integer strings, or already-scaled
//! decimal strings. `TokenRecord` normalises one entry and checks it against
//! a `TokenTarget` with independent, short-circuiting predicates.

use rust_decimal::prelude::*;
use serde_json::{Map, Value};

use crate::types::DEFAULT_TOKEN_DECIMALS;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMALS: u32 = 28;

const CONTRACT_FIELDS: &[&str] = &["contract_address", "contractAddress", "tokenId"];
const TOKEN_INFO_FIELDS: &[&str] = &["token_info", "tokenInfo"];
const SYMBOL_FIELDS: &[&str] = &["symbol", "tokenAbbr", "tokenAbbreviation"];
const BALANCE_FIELDS: &[&str] = &["balance", "quantity", "amount"];
const DECIMALS_FIELDS: &[&str] = &["decimals", "tokenDecimal"];

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// The token whose balance the resolver looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTarget {
    pub contract: String,
    pub symbol: String,
    pub name: String,
    /// Decimals assumed when an entry carries no hint.
    pub decimals: u32,
}

impl TokenTarget {
    /// USDT on TRON.
    pub fn usdt() -> Self {
        Self {
            contract: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(),
            symbol: "USDT".to_string(),
            name: "Tether USD".to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse rule
// ---------------------------------------------------------------------------

/// Convert a balance value to human units.
///
/// - a JSON number is a raw amount, divided by `10^decimals`
/// - a string with a decimal point is already scaled and used as-is
/// - any other string is a raw integer, divided by `10^decimals`
///
/// `decimals_hint` may be a number or a numeric string; when absent
/// `default_decimals` applies. Anything unparseable (including a negative
/// result) yields zero for this value only.
pub fn parse_token_balance(
    value: &Value,
    decimals_hint: Option<&Value>,
    default_decimals: u32,
) -> Decimal {
    try_parse_balance(value, decimals_hint, default_decimals)
        .filter(|amount| !amount.is_sign_negative())
        .unwrap_or(Decimal::ZERO)
}

fn try_parse_balance(
    value: &Value,
    decimals_hint: Option<&Value>,
    default_decimals: u32,
) -> Option<Decimal> {
    let decimals = || match decimals_hint {
        Some(hint) => parse_decimals(hint),
        None => Some(default_decimals).filter(|d| *d <= MAX_DECIMALS),
    };

    match value {
        Value::Number(n) => scale_raw(number_to_decimal(n)?, decimals()?),
        Value::String(s) if s.contains('.') => Decimal::from_str(s.trim()).ok(),
        Value::String(s) => {
            let raw = s.trim().parse::<i128>().ok()?;
            scale_raw(Decimal::from_i128(raw)?, decimals()?)
        }
        _ => None,
    }
}

/// Read a decimals hint (`6`, `6.0`, or `"6"`).
fn parse_decimals(hint: &Value) -> Option<u32> {
    let decimals = match hint {
        Value::Number(n) => match n.as_u64() {
            Some(d) => u32::try_from(d).ok()?,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 0.0 {
                    return None;
                }
                f as u32
            }
        },
        Value::String(s) => s.trim().parse::<u32>().ok()?,
        _ => return None,
    };
    (decimals <= MAX_DECIMALS).then_some(decimals)
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        Some(Decimal::from(i))
    } else if let Some(u) = n.as_u64() {
        Some(Decimal::from(u))
    } else {
        Decimal::from_f64(n.as_f64()?)
    }
}

/// `raw / 10^decimals`, exact.
pub fn scale_raw(raw: Decimal, decimals: u32) -> Option<Decimal> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    raw.checked_mul(Decimal::new(1, decimals))
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Loose truthiness: null, false, zero, and empty strings/collections are
/// treated as missing so that the next alternative field is consulted.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First truthy value among `keys`.
fn first_truthy<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| is_truthy(v))
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    first_truthy(obj, keys).and_then(Value::as_str)
}

// ---------------------------------------------------------------------------
// Token records
// ---------------------------------------------------------------------------

/// Which predicate matched an entry. Also decides where its balance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `contract_address` / `contractAddress` / `tokenId` equals the contract.
    ContractField,
    /// Nested `token_info.address` equals the contract.
    TokenInfo,
    /// The entry is keyed by the contract address literal.
    KeyedBalance,
    /// Symbol or display name equals the target's.
    SymbolOrName,
}

/// One token entry from a provider response, viewed through a normalised
/// lens.
#[derive(Debug, Clone, Copy)]
pub struct TokenRecord<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> TokenRecord<'a> {
    /// Non-object entries are not token records.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| Self { fields })
    }

    pub fn contract(&self) -> Option<&'a str> {
        first_str(self.fields, CONTRACT_FIELDS)
    }

    fn token_info(&self) -> Option<&'a Map<String, Value>> {
        first_truthy(self.fields, TOKEN_INFO_FIELDS).and_then(Value::as_object)
    }

    pub fn token_info_address(&self) -> Option<&'a str> {
        self.token_info()?.get("address")?.as_str()
    }

    pub fn symbol(&self) -> Option<&'a str> {
        first_str(self.fields, SYMBOL_FIELDS)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Check the predicates in priority order; the first hit wins.
    pub fn match_target(&self, target: &TokenTarget) -> Option<MatchKind> {
        if self.contract() == Some(target.contract.as_str()) {
            Some(MatchKind::ContractField)
        } else if self.token_info_address() == Some(target.contract.as_str()) {
            Some(MatchKind::TokenInfo)
        } else if self.fields.contains_key(&target.contract) {
            Some(MatchKind::KeyedBalance)
        } else if self.symbol() == Some(target.symbol.as_str())
            || self.name() == Some(target.name.as_str())
        {
            Some(MatchKind::SymbolOrName)
        } else {
            None
        }
    }

    /// Balance of this entry in human units, read according to how it
    /// matched.
    pub fn amount(&self, kind: MatchKind, target: &TokenTarget) -> Decimal {
        match kind {
            MatchKind::KeyedBalance => self
                .fields
                .get(&target.contract)
                .map(|raw| parse_token_balance(raw, None, target.decimals))
                .unwrap_or(Decimal::ZERO),
            MatchKind::TokenInfo => {
                let hint = first_truthy(self.fields, &["tokenDecimal"]).or_else(|| {
                    self.token_info()
                        .and_then(|info| first_truthy(info, &["decimals"]))
                });
                self.balance_with(hint, target)
            }
            MatchKind::ContractField | MatchKind::SymbolOrName => {
                self.balance_with(first_truthy(self.fields, DECIMALS_FIELDS), target)
            }
        }
    }

    fn balance_with(&self, hint: Option<&Value>, target: &TokenTarget) -> Decimal {
        match first_truthy(self.fields, BALANCE_FIELDS) {
            Some(balance) => parse_token_balance(balance, hint, target.decimals),
            None => Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Token lists
// ---------------------------------------------------------------------------

/// A provider's token-list response after shape detection.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenList<'a> {
    /// The response carried a recognisable list of entries.
    Entries(Vec<&'a Value>),
    /// The response was some other shape; nothing to scan.
    Unrecognized,
}

impl<'a> TokenList<'a> {
    /// Amount held in the first entry matching `target`, if any entry
    /// matches.
    pub fn find_amount(&self, target: &TokenTarget) -> Option<Decimal> {
        let TokenList::Entries(entries) = self else {
            return None;
        };
        entries
            .iter()
            .filter_map(|entry| TokenRecord::from_value(entry))
            .find_map(|record| {
                record
                    .match_target(target)
                    .map(|kind| record.amount(kind, target))
            })
    }

    pub fn len(&self) -> usize {
        match self {
            TokenList::Entries(entries) => entries.len(),
            TokenList::Unrecognized => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
