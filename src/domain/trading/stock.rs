use crate::domain::errors::StockError;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Identity and dividend parameters shared by every stock variant.
///
/// The symbol is upper-cased on construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockListing {
    symbol: String,
    last_dividend: i64,
    par_value: i64,
    fixed_dividend: Option<Decimal>,
}

impl StockListing {
    pub fn new(
        symbol: &str,
        last_dividend: i64,
        par_value: i64,
        fixed_dividend: Option<Decimal>,
    ) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            last_dividend,
            par_value,
            fixed_dividend,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Last dividend in pence
    pub fn last_dividend(&self) -> i64 {
        self.last_dividend
    }

    pub fn par_value(&self) -> i64 {
        self.par_value
    }

    /// Fixed dividend as a fraction of par (e.g. 0.02 for 2%)
    pub fn fixed_dividend(&self) -> Option<Decimal> {
        self.fixed_dividend
    }
}

/// A stock tradable on the exchange.
///
/// Variants differ only in how the dividend yield is derived; the P/E ratio is
/// always the inverse of that yield.
pub trait Stock: fmt::Debug + fmt::Display + Send + Sync {
    fn listing(&self) -> &StockListing;

    /// Dividend yield for a price in pence.
    fn dividend_yield(&self, price: Decimal) -> Result<Decimal, StockError>;

    fn symbol(&self) -> &str {
        self.listing().symbol()
    }

    fn last_dividend(&self) -> i64 {
        self.listing().last_dividend()
    }

    fn par_value(&self) -> i64 {
        self.listing().par_value()
    }

    fn fixed_dividend(&self) -> Option<Decimal> {
        self.listing().fixed_dividend()
    }

    /// P/E ratio for a price in pence, `1 / dividend_yield(price)`.
    ///
    /// A zero yield is an error, not a sentinel.
    fn pe_ratio(&self, price: Decimal) -> Result<Decimal, StockError> {
        let dividend_yield = self.dividend_yield(price)?;
        checked_ratio(Decimal::ONE, dividend_yield, self.symbol(), "pe_ratio")
    }
}

/// `numerator / denominator`, telling a zero divisor apart from an overflow
fn checked_ratio(
    numerator: Decimal,
    denominator: Decimal,
    symbol: &str,
    operation: &'static str,
) -> Result<Decimal, StockError> {
    if denominator.is_zero() {
        return Err(StockError::DivisionByZero {
            symbol: symbol.to_string(),
            operation,
        });
    }

    numerator
        .checked_div(denominator)
        .ok_or_else(|| StockError::Overflow {
            symbol: symbol.to_string(),
            operation,
        })
}

/// Common stock: yield is `last_dividend / price`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonStock {
    listing: StockListing,
}

impl CommonStock {
    pub fn new(symbol: &str, last_dividend: i64, par_value: i64) -> Self {
        Self {
            listing: StockListing::new(symbol, last_dividend, par_value, None),
        }
    }
}

impl Stock for CommonStock {
    fn listing(&self) -> &StockListing {
        &self.listing
    }

    fn dividend_yield(&self, price: Decimal) -> Result<Decimal, StockError> {
        checked_ratio(
            Decimal::from(self.listing.last_dividend),
            price,
            &self.listing.symbol,
            "dividend_yield",
        )
    }
}

impl fmt::Display for CommonStock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CommonStock `{}`>", self.listing.symbol)
    }
}

/// Preferred stock: yield is `fixed_dividend * par_value / price`, or zero
/// when no fixed dividend is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferredStock {
    listing: StockListing,
}

impl PreferredStock {
    pub fn new(
        symbol: &str,
        last_dividend: i64,
        fixed_dividend: Option<Decimal>,
        par_value: i64,
    ) -> Self {
        Self {
            listing: StockListing::new(symbol, last_dividend, par_value, fixed_dividend),
        }
    }
}

impl Stock for PreferredStock {
    fn listing(&self) -> &StockListing {
        &self.listing
    }

    fn dividend_yield(&self, price: Decimal) -> Result<Decimal, StockError> {
        let Some(fixed_dividend) = self.listing.fixed_dividend else {
            return Ok(Decimal::ZERO);
        };

        let dividend = fixed_dividend
            .checked_mul(Decimal::from(self.listing.par_value))
            .ok_or_else(|| StockError::Overflow {
                symbol: self.listing.symbol.clone(),
                operation: "dividend_yield",
            })?;
        checked_ratio(dividend, price, &self.listing.symbol, "dividend_yield")
    }
}

impl fmt::Display for PreferredStock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PreferredStock `{}`>", self.listing.symbol)
    }
}

/// Stock variant selector, e.g. when loading a listing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockKind {
    Common,
    Preferred,
}

impl StockKind {
    pub fn build(
        self,
        symbol: &str,
        last_dividend: i64,
        par_value: i64,
        fixed_dividend: Option<Decimal>,
    ) -> Arc<dyn Stock> {
        match self {
            StockKind::Common => Arc::new(CommonStock::new(symbol, last_dividend, par_value)),
            StockKind::Preferred => Arc::new(PreferredStock::new(
                symbol,
                last_dividend,
                fixed_dividend,
                par_value,
            )),
        }
    }
}

impl FromStr for StockKind {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "common" => Ok(StockKind::Common),
            "preferred" => Ok(StockKind::Preferred),
            other => Err(StockError::Unimplemented {
                operation: format!("dividend_yield for stock kind '{}'", other),
            }),
        }
    }
}

impl fmt::Display for StockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockKind::Common => write!(f, "Common"),
            StockKind::Preferred => write!(f, "Preferred"),
        }
    }
}
