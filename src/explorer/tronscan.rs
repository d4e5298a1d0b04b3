//! Tronscan token list (secondary provider).
//!
//! `GET /api/account/tokens?address={address}&token=trc20` returns an object
//! whose entries may be split across `data` and `tokens`; either field can
//! be missing. Some deployments answer with a bare list.

use serde_json::Value;

use super::token::TokenList;

pub fn token_list(body: &Value) -> TokenList<'_> {
    match body {
        Value::Object(obj) => {
            let entries: Vec<&Value> = ["data", "tokens"]
                .iter()
                .filter_map(move |field| obj.get(*field).and_then(Value::as_array))
                .flatten()
                .collect();
            TokenList::Entries(entries)
        }
        Value::Array(items) => TokenList::Entries(items.iter().collect()),
        _ => TokenList::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::token::TokenTarget;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_merges_data_and_tokens() {
        let body = json!({
            "data": [{"tokenAbbr": "WIN", "balance": "1"}],
            "tokens": [{"tokenAbbr": "USDT", "balance": "8800000", "tokenDecimal": 6}]
        });
        let list = token_list(&body);
        assert_eq!(list.len(), 2);
        assert_eq!(list.find_amount(&TokenTarget::usdt()), Some(dec!(8.8)));
    }

    #[test]
    fn test_one_field_missing() {
        let body = json!({"tokens": [{"tokenAbbreviation": "USDT", "quantity": "3.25"}]});
        assert_eq!(token_list(&body).find_amount(&TokenTarget::usdt()), Some(dec!(3.25)));

        let body = json!({"data": null, "tokens": []});
        assert!(token_list(&body).is_empty());
    }

    #[test]
    fn test_bare_list() {
        let body = json!([{"contractAddress": "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", "balance": 1000000}]);
        assert_eq!(token_list(&body).find_amount(&TokenTarget::usdt()), Some(dec!(1)));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(token_list(&json!(12)), TokenList::Unrecognized);
    }
}
