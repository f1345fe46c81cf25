use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by per-stock valuation formulas
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Division by zero computing {operation} for {symbol}")]
    DivisionByZero {
        symbol: String,
        operation: &'static str,
    },

    #[error("Overflow computing {operation} for {symbol}")]
    Overflow {
        symbol: String,
        operation: &'static str,
    },

    #[error("Unimplemented operation: {operation}")]
    Unimplemented { operation: String },
}

/// Errors raised by trade aggregation and exchange statistics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("Division by zero: {context}")]
    DivisionByZero { context: String },

    #[error("Cannot take geometric mean of negative price {price} for {symbol}")]
    NegativePrice { symbol: String, price: Decimal },

    #[error("Result is not representable as a decimal: {context}")]
    NonFiniteResult { context: String },

    #[error(transparent)]
    Stock(#[from] StockError),
}
