//! Exchange ledger and exchange-wide price statistics.
//!
//! The ledger is append-only and keeps trades in recording order. Statistics
//! are derived on demand by filtering the ledger against a window anchored at
//! the exchange clock's current instant (read once per query).

use crate::config::ExchangeConfig;
use crate::domain::errors::ExchangeError;
use crate::domain::performance::stats::Stats;
use crate::domain::ports::Clock;
use crate::domain::trading::stock::Stock;
use crate::domain::trading::types::{Trade, TradeType};
use crate::infrastructure::clock::SystemClock;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub struct Exchange {
    trades: Vec<Trade>,
    clock: Arc<dyn Clock>,
    config: ExchangeConfig,
}

impl Exchange {
    /// Empty exchange on the system UTC clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            trades: Vec::new(),
            clock,
            config: ExchangeConfig::default(),
        }
    }

    pub fn from_config(config: ExchangeConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Trades in recording order
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Append a trade to the ledger
    pub fn record_trade(&mut self, trade: Trade) {
        debug!("Recording {} at {}", trade, trade.timestamp());
        self.trades.push(trade);
    }

    /// Stamp a trade with the exchange clock and record it
    pub fn trade(
        &mut self,
        stock: Arc<dyn Stock>,
        quantity: i64,
        action: TradeType,
        price: Decimal,
    ) -> &Trade {
        let trade = Trade::new(stock, quantity, action, price, self.clock.as_ref());
        self.record_trade(trade);
        &self.trades[self.trades.len() - 1]
    }

    /// Volume weighted price of `symbol` over the last `window`.
    ///
    /// The symbol is matched case-insensitively. Returns `Ok(None)` when no
    /// trade of that stock falls in the window.
    pub fn price_by_stock(
        &self,
        symbol: &str,
        window: Duration,
    ) -> Result<Option<Decimal>, ExchangeError> {
        let symbol = symbol.to_uppercase();
        let since = self.window_start(Some(window));

        let trades: Vec<Trade> = self
            .trades
            .iter()
            .filter(|t| t.symbol() == symbol && Self::in_window(t, since))
            .cloned()
            .collect();

        if trades.is_empty() {
            debug!("No trades for {} since {:?}", symbol, since);
            return Ok(None);
        }

        let price = Trade::volume_weighted_price(&trades)?;
        debug!(
            "Volume weighted price for {} over {} trades: {}",
            symbol,
            trades.len(),
            price
        );
        Ok(Some(price))
    }

    /// `price_by_stock` over the configured price window
    pub fn recent_price(&self, symbol: &str) -> Result<Option<Decimal>, ExchangeError> {
        self.price_by_stock(symbol, self.config.price_window)
    }

    /// All-share index: geometric mean of per-symbol volume weighted prices.
    ///
    /// `None` or a zero window covers every recorded trade. Returns `Ok(None)`
    /// when no trade falls in the window.
    pub fn all_share_index(
        &self,
        window: Option<Duration>,
    ) -> Result<Option<Decimal>, ExchangeError> {
        let window = window.filter(|w| !w.is_zero());
        let since = self.window_start(window);

        // Symbols are upper-cased at listing time, so grouping on the stored
        // symbol agrees with the normalisation in `price_by_stock`.
        let mut groups: BTreeMap<&str, Vec<Trade>> = BTreeMap::new();
        for trade in self.trades.iter().filter(|t| Self::in_window(t, since)) {
            groups
                .entry(trade.symbol())
                .or_default()
                .push(trade.clone());
        }

        if groups.is_empty() {
            debug!("No trades for all-share index since {:?}", since);
            return Ok(None);
        }

        let mut prices = Vec::with_capacity(groups.len());
        for (symbol, trades) in &groups {
            prices.push((*symbol, Trade::volume_weighted_price(trades)?));
        }

        let index = Stats::geometric_mean(prices)?;
        debug!("All-share index over {} stocks: {}", groups.len(), index);
        Ok(Some(index))
    }

    /// `all_share_index` over the configured index window
    pub fn recent_index(&self) -> Result<Option<Decimal>, ExchangeError> {
        self.all_share_index(self.config.index_window)
    }

    /// Earliest included instant, or `None` for all time
    fn window_start(&self, window: Option<Duration>) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        // A window reaching past the representable range covers all time
        window.and_then(|w| now.checked_sub_signed(w))
    }

    fn in_window(trade: &Trade, since: Option<DateTime<Utc>>) -> bool {
        since.is_none_or(|start| trade.timestamp() >= start)
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("trades", &self.trades)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Exchange: {} trades>", self.trades.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::stock::{CommonStock, PreferredStock};
    use crate::infrastructure::clock::ManualClock;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const FIVE_MINUTES: i64 = 5 * 60;

    fn setup() -> (Arc<ManualClock>, Exchange) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2018, 6, 22, 12, 0, 0).unwrap(),
        ));
        let exchange = Exchange::with_clock(clock.clone());
        (clock, exchange)
    }

    fn stock(symbol: &str) -> Arc<dyn Stock> {
        Arc::new(CommonStock::new(symbol, 8, 100))
    }

    fn close(actual: Decimal, expected: Decimal) -> bool {
        (actual - expected).abs() < dec!(0.0000001)
    }

    #[test]
    fn test_create_exchange() {
        let exchange = Exchange::new();
        assert!(exchange.is_empty());
        assert_eq!(exchange.len(), 0);
        assert_eq!(exchange.to_string(), "<Exchange: 0 trades>");
    }

    #[test]
    fn test_record_trade() {
        let (clock, mut exchange) = setup();
        let trade = Trade::new(stock("TEST"), 10, TradeType::Buy, dec!(5), &*clock);
        exchange.record_trade(trade);

        let last = exchange.trades().last().unwrap();
        assert_eq!(last.quantity(), 10);
        assert_eq!(last.symbol(), "TEST");
    }

    #[test]
    fn test_record_multiple_trades_preserves_order() {
        let (_, mut exchange) = setup();
        for quantity in 1..=5 {
            exchange.trade(stock("TEST"), quantity, TradeType::Buy, dec!(100));
        }

        assert_eq!(exchange.len(), 5);
        assert_eq!(exchange.trades()[0].quantity(), 1);
        assert_eq!(exchange.trades()[4].quantity(), 5);
    }

    #[test]
    fn test_trade_helper_uses_exchange_clock() {
        let (clock, mut exchange) = setup();
        let stamped = exchange.trade(stock("TEST"), 1, TradeType::Sell, dec!(1)).timestamp();
        assert_eq!(stamped, clock.now());
        assert_eq!(exchange.clock().now(), clock.now());
    }

    #[test]
    fn test_volume_weighted_price_by_stock() {
        let (_, mut exchange) = setup();
        let test = stock("TEST");
        exchange.trade(test.clone(), 16, TradeType::Buy, dec!(100));
        exchange.trade(test, 32, TradeType::Buy, dec!(50));

        let price = exchange
            .price_by_stock("TEST", Duration::seconds(FIVE_MINUTES))
            .unwrap()
            .unwrap();
        assert!(close(price, dec!(66.6666667)), "got {}", price);
    }

    #[test]
    fn test_price_by_stock_is_case_insensitive() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("tea"), 42, TradeType::Buy, dec!(32));

        let price = exchange
            .price_by_stock("Tea", Duration::seconds(FIVE_MINUTES))
            .unwrap();
        assert_eq!(price, Some(dec!(32)));
    }

    #[test]
    fn test_price_by_stock_none_without_trades() {
        let (_, exchange) = setup();
        let price = exchange
            .price_by_stock("TEST", Duration::seconds(FIVE_MINUTES))
            .unwrap();
        assert!(price.is_none());
    }

    #[test]
    fn test_price_by_stock_distinguishes_zero_price_from_no_data() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("FREE"), 10, TradeType::Buy, Decimal::ZERO);

        let window = Duration::seconds(FIVE_MINUTES);
        assert_eq!(
            exchange.price_by_stock("FREE", window).unwrap(),
            Some(Decimal::ZERO)
        );
        assert_eq!(exchange.price_by_stock("OTHER", window).unwrap(), None);
    }

    #[test]
    fn test_price_by_stock_excludes_trades_outside_window() {
        let (clock, mut exchange) = setup();
        let test = stock("TEST");
        exchange.trade(test.clone(), 16, TradeType::Buy, dec!(100));

        clock.advance(Duration::seconds(FIVE_MINUTES + 10));
        exchange.trade(test.clone(), 32, TradeType::Buy, dec!(50));
        exchange.trade(test, 64, TradeType::Buy, dec!(100));

        let price = exchange
            .price_by_stock("TEST", Duration::seconds(FIVE_MINUTES))
            .unwrap()
            .unwrap();
        assert!(close(price, dec!(83.3333333)), "got {}", price);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let (clock, mut exchange) = setup();
        exchange.trade(stock("TEST"), 1, TradeType::Buy, dec!(10));

        clock.advance(Duration::seconds(FIVE_MINUTES));
        let window = Duration::seconds(FIVE_MINUTES);
        assert_eq!(exchange.price_by_stock("TEST", window).unwrap(), Some(dec!(10)));

        clock.advance(Duration::milliseconds(1));
        assert_eq!(exchange.price_by_stock("TEST", window).unwrap(), None);
    }

    #[test]
    fn test_price_by_stock_zero_quantity_is_division_by_zero() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("TEST"), 0, TradeType::Buy, dec!(10));

        let err = exchange
            .price_by_stock("TEST", Duration::seconds(FIVE_MINUTES))
            .unwrap_err();
        assert!(matches!(err, ExchangeError::DivisionByZero { .. }));
    }

    #[test]
    fn test_price_by_stock_overflow_is_error() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("BIG"), i64::MAX, TradeType::Buy, dec!(100000000000));

        let err = exchange
            .price_by_stock("BIG", Duration::seconds(FIVE_MINUTES))
            .unwrap_err();
        assert!(matches!(err, ExchangeError::NonFiniteResult { .. }));
        assert!(exchange.all_share_index(None).is_err());
    }

    #[test]
    fn test_from_config_keeps_windows() {
        let config = ExchangeConfig {
            price_window: Duration::seconds(30),
            index_window: None,
        };
        let exchange = Exchange::from_config(config.clone());
        assert_eq!(exchange.config(), &config);
        assert!(exchange.is_empty());
    }

    #[test]
    fn test_all_share_index() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("TEA"), 16, TradeType::Buy, dec!(100));
        exchange.trade(stock("POP"), 32, TradeType::Buy, dec!(50));
        exchange.trade(stock("POP"), 64, TradeType::Buy, dec!(100));

        let index = exchange
            .all_share_index(Some(Duration::seconds(FIVE_MINUTES)))
            .unwrap()
            .unwrap();
        assert!(close(index, dec!(91.2870929)), "got {}", index);
    }

    #[test]
    fn test_all_share_index_none_without_trades() {
        let (_, exchange) = setup();
        assert!(exchange
            .all_share_index(Some(Duration::seconds(FIVE_MINUTES)))
            .unwrap()
            .is_none());
        assert!(exchange.all_share_index(None).unwrap().is_none());
    }

    #[test]
    fn test_all_share_index_none_for_empty_window() {
        let (clock, mut exchange) = setup();
        exchange.trade(stock("TEA"), 16, TradeType::Buy, dec!(100));
        clock.advance(Duration::hours(1));

        assert!(exchange
            .all_share_index(Some(Duration::seconds(FIVE_MINUTES)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_all_share_index_all_time() {
        let (clock, mut exchange) = setup();
        exchange.trade(stock("TEA"), 1, TradeType::Buy, dec!(4));
        clock.advance(Duration::days(30));
        exchange.trade(stock("POP"), 1, TradeType::Buy, dec!(16));

        for window in [None, Some(Duration::zero())] {
            let index = exchange.all_share_index(window).unwrap();
            assert!(close(index.unwrap(), dec!(8)), "got {:?}", index);
        }
        // Only POP remains inside five minutes
        let recent = exchange
            .all_share_index(Some(Duration::seconds(FIVE_MINUTES)))
            .unwrap();
        assert!(close(recent.unwrap(), dec!(16)));
    }

    #[test]
    fn test_all_share_index_groups_mixed_case_symbols_together() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("pop"), 10, TradeType::Buy, dec!(10));
        exchange.trade(stock("POP"), 10, TradeType::Buy, dec!(30));

        // One group with VWAP 20, not two groups of 10 and 30
        let index = exchange.all_share_index(None).unwrap().unwrap();
        assert!(close(index, dec!(20)), "got {}", index);
    }

    #[test]
    fn test_all_share_index_rejects_negative_group_price() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("POP"), 10, TradeType::Buy, dec!(10));
        exchange.trade(stock("BAD"), 10, TradeType::Buy, dec!(-5));

        let err = exchange.all_share_index(None).unwrap_err();
        assert!(matches!(err, ExchangeError::NegativePrice { ref symbol, .. } if symbol == "BAD"));
    }

    #[test]
    fn test_all_share_index_with_zero_group_price_is_zero() {
        let (_, mut exchange) = setup();
        exchange.trade(stock("POP"), 10, TradeType::Buy, dec!(10));
        exchange.trade(stock("FREE"), 10, TradeType::Buy, Decimal::ZERO);

        assert_eq!(exchange.all_share_index(None).unwrap(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_recent_price_uses_configured_window() {
        let (clock, exchange) = setup();
        let mut exchange = exchange.with_config(ExchangeConfig {
            price_window: Duration::seconds(60),
            index_window: Some(Duration::seconds(60)),
        });
        let gin: Arc<dyn Stock> = Arc::new(PreferredStock::new("GIN", 8, Some(dec!(0.02)), 100));
        exchange.trade(gin.clone(), 10, TradeType::Buy, dec!(100));

        clock.advance(Duration::seconds(120));
        exchange.trade(gin, 10, TradeType::Buy, dec!(200));

        assert_eq!(exchange.recent_price("gin").unwrap(), Some(dec!(200)));
        let index = exchange.recent_index().unwrap().unwrap();
        assert!(close(index, dec!(200)), "got {}", index);
    }
}
