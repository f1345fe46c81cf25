use crate::domain::errors::ExchangeError;
use crate::domain::ports::Clock;
use crate::domain::trading::stock::Stock;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Direction of a trade. Recorded for the audit trail only; prices ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn sign(&self) -> i8 {
        match self {
            TradeType::Buy => 1,
            TradeType::Sell => -1,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => write!(f, "BUY"),
            TradeType::Sell => write!(f, "SELL"),
        }
    }
}

/// A single transaction against a stock.
///
/// Immutable once built; the timestamp is taken from the clock exactly once.
#[derive(Debug, Clone)]
pub struct Trade {
    stock: Arc<dyn Stock>,
    quantity: i64,
    action: TradeType,
    price: Decimal,
    timestamp: DateTime<Utc>,
}

impl Trade {
    /// Create a trade stamped with the clock's current instant
    pub fn new(
        stock: Arc<dyn Stock>,
        quantity: i64,
        action: TradeType,
        price: Decimal,
        clock: &dyn Clock,
    ) -> Self {
        Self::at(stock, quantity, action, price, clock.now())
    }

    /// Create a trade with an explicit timestamp
    pub fn at(
        stock: Arc<dyn Stock>,
        quantity: i64,
        action: TradeType,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            stock,
            quantity,
            action,
            price,
            timestamp,
        }
    }

    pub fn stock(&self) -> &Arc<dyn Stock> {
        &self.stock
    }

    pub fn symbol(&self) -> &str {
        self.stock.symbol()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn action(&self) -> TradeType {
        self.action
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// price * quantity, or an error when it exceeds the decimal range
    pub fn notional(&self) -> Result<Decimal, ExchangeError> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| ExchangeError::NonFiniteResult {
                context: format!("notional of {}", self),
            })
    }

    /// Volume weighted price: Σ(price × quantity) / Σ(quantity)
    ///
    /// Callers must pass a non-empty slice with non-zero total quantity,
    /// anything else is a division by zero. Totals are accumulated in
    /// `Decimal` with checked arithmetic.
    pub fn volume_weighted_price(trades: &[Trade]) -> Result<Decimal, ExchangeError> {
        let mut notional = Decimal::ZERO;
        let mut volume = Decimal::ZERO;

        for trade in trades {
            notional = notional.checked_add(trade.notional()?).ok_or_else(|| {
                ExchangeError::NonFiniteResult {
                    context: format!("total notional over {} trades", trades.len()),
                }
            })?;
            volume = volume
                .checked_add(Decimal::from(trade.quantity))
                .ok_or_else(|| ExchangeError::NonFiniteResult {
                    context: format!("total quantity over {} trades", trades.len()),
                })?;
        }

        if volume.is_zero() {
            return Err(ExchangeError::DivisionByZero {
                context: format!(
                    "volume weighted price over {} trades with total quantity {}",
                    trades.len(),
                    volume
                ),
            });
        }

        notional
            .checked_div(volume)
            .ok_or_else(|| ExchangeError::NonFiniteResult {
                context: format!("{} / {}", notional, volume),
            })
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Trade {} {} of `{}` @ {}>",
            self.action,
            self.quantity,
            self.stock.symbol(),
            self.price
        )
    }
}
