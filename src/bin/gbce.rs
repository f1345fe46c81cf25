//! GBCE walkthrough
//!
//! Builds the Global Beverage Corporation Exchange sample stocks, prints their
//! valuations at a reference price, records a handful of trades and reports
//! volume weighted prices and the all-share index.
//!
//! # Usage
//! ```sh
//! RUST_LOG=debug SSSM_PRICE_WINDOW_SECS=300 cargo run --bin gbce
//! ```
//!
//! # Environment Variables
//! - `SSSM_PRICE_WINDOW_SECS` - Window for per-stock prices (default: 300)
//! - `SSSM_INDEX_WINDOW_SECS` - Window for the all-share index, 0 for all time (default: 0)

use anyhow::{Context, Result};
use rust_decimal_macros::dec;
use sssm::config::ExchangeConfig;
use sssm::domain::trading::gbce::sample_stocks;
use sssm::domain::trading::{Exchange, TradeType};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("GBCE {} starting...", env!("CARGO_PKG_VERSION"));

    let exchange_config = ExchangeConfig::from_env()?;

    let stocks = sample_stocks();
    let reference_price = dec!(100);

    for stock in stocks.values() {
        let dividend_yield = stock.dividend_yield(reference_price)?;
        match stock.pe_ratio(reference_price) {
            Ok(pe) => info!(
                "{} @ {}: yield={} P/E={}",
                stock, reference_price, dividend_yield, pe
            ),
            Err(e) => warn!(
                "{} @ {}: yield={} P/E unavailable ({})",
                stock, reference_price, dividend_yield, e
            ),
        }
    }

    let mut exchange = Exchange::from_config(exchange_config);
    let config = exchange.config();
    info!(
        "Configuration loaded: price window={}s, index window={:?}",
        config.price_window.num_seconds(),
        config.index_window.map(|w| w.num_seconds())
    );
    let trades = [
        ("TEA", 42, TradeType::Buy, dec!(32)),
        ("POP", 420, TradeType::Buy, dec!(8)),
        ("POP", 420, TradeType::Buy, dec!(16)),
        ("GIN", 1000, TradeType::Buy, dec!(512)),
        ("GIN", 1000, TradeType::Buy, dec!(256)),
        ("GIN", 2000, TradeType::Buy, dec!(128)),
    ];
    for (symbol, quantity, action, price) in trades {
        let stock = stocks
            .get(symbol)
            .with_context(|| format!("Unknown GBCE symbol {}", symbol))?;
        let trade = exchange.trade(stock.clone(), quantity, action, price);
        info!("Recorded {}", trade);
    }
    info!("{}", exchange);

    for symbol in stocks.keys() {
        match exchange.recent_price(symbol)? {
            Some(price) => info!("{} volume weighted price: {}", symbol, price.round_dp(4)),
            None => info!("{} volume weighted price: no trades in window", symbol),
        }
    }

    match exchange.recent_index()? {
        Some(index) => info!("GBCE All Share Index: {}", index.round_dp(7)),
        None => info!("GBCE All Share Index: no trades in window"),
    }

    Ok(())
}
