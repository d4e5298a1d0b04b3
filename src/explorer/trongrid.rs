//! TronGrid response shapes.
//!
//! API docs: https://developers.tron.network/reference/get-account-info-by-address
//! `GET /v1/accounts/{address}` → `{ "data": [ { "balance": <sun>, "trc20": [ { "<contract>": "<raw>" } ] } ] }`
//! `GET /v1/accounts/{address}/trc20` → either `{ "data": [ ... ] }` or a bare list.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::token::{parse_token_balance, scale_raw, TokenList, TokenTarget};
use crate::types::{BalanceError, NATIVE_DECIMALS};

const SOURCE_NAME: &str = "trongrid";

/// Shape of an account summary response.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountSummary<'a> {
    /// The first account object in `data`.
    Account(&'a Map<String, Value>),
    /// `data` missing or empty: the address has never been activated.
    Empty,
}

/// Classify an account summary. Anything that is not an object with an
/// optional `data` list of account objects is a decode error.
pub fn parse_account(body: &Value) -> Result<AccountSummary<'_>, BalanceError> {
    let obj = body
        .as_object()
        .ok_or_else(|| BalanceError::decode(SOURCE_NAME, "account summary is not an object"))?;

    let data = match obj.get("data") {
        None | Some(Value::Null) => return Ok(AccountSummary::Empty),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(BalanceError::decode(SOURCE_NAME, "`data` is not a list"));
        }
    };

    match data.first() {
        None => Ok(AccountSummary::Empty),
        Some(Value::Object(account)) => Ok(AccountSummary::Account(account)),
        Some(_) => Err(BalanceError::decode(SOURCE_NAME, "account entry is not an object")),
    }
}

/// Native balance in TRX. A missing balance means zero; a balance that is
/// not an integer is a decode error.
pub fn native_balance(account: &Map<String, Value>) -> Result<Decimal, BalanceError> {
    let raw = match account.get("balance") {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(Value::Number(n)) => n.as_i64().map(i128::from).or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i128)
        }),
        Some(Value::String(s)) => s.trim().parse::<i128>().ok(),
        Some(_) => None,
    };

    raw.and_then(|r| Decimal::try_from_i128_with_scale(r, 0).ok())
        .and_then(|r| scale_raw(r, NATIVE_DECIMALS))
        .filter(|amount| !amount.is_sign_negative())
        .ok_or_else(|| {
            BalanceError::decode(SOURCE_NAME, format!("invalid balance: {:?}", account.get("balance")))
        })
}

/// Target token balance from the account's inline `trc20` list, or zero
/// when the list is absent, malformed, or lacks the contract.
pub fn inline_token_balance(account: &Map<String, Value>, target: &TokenTarget) -> Decimal {
    account
        .get("trc20")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .find_map(|entry| entry.get(&target.contract))
        .map(|raw| parse_token_balance(raw, None, target.decimals))
        .unwrap_or(Decimal::ZERO)
}

/// Entries of a `/trc20` token-list response.
pub fn token_list(body: &Value) -> TokenList<'_> {
    match body {
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => TokenList::Entries(items.iter().collect()),
            _ => TokenList::Unrecognized,
        },
        Value::Array(items) => TokenList::Entries(items.iter().collect()),
        _ => TokenList::Unrecognized,
    }
}
