//! Global Beverage Corporation Exchange reference listings.

use crate::domain::trading::stock::{Stock, StockKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;

/// (symbol, kind, last dividend, fixed dividend, par value)
const SAMPLE_LISTINGS: &[(&str, StockKind, i64, Option<Decimal>, i64)] = &[
    ("TEA", StockKind::Common, 0, None, 100),
    ("POP", StockKind::Common, 8, None, 100),
    ("ALE", StockKind::Common, 23, None, 60),
    ("GIN", StockKind::Preferred, 8, Some(dec!(0.02)), 100),
    ("JOE", StockKind::Common, 13, None, 250),
];

/// GBCE sample stocks keyed by symbol
pub fn sample_stocks() -> BTreeMap<String, Arc<dyn Stock>> {
    SAMPLE_LISTINGS
        .iter()
        .map(|&(symbol, kind, last_dividend, fixed_dividend, par_value)| {
            (
                symbol.to_string(),
                kind.build(symbol, last_dividend, par_value, fixed_dividend),
            )
        })
        .collect()
}
