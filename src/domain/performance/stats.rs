use crate::domain::errors::ExchangeError;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::warn;

/// Shared statistics utilities for exchange-wide aggregates.
pub struct Stats;

impl Stats {
    /// Geometric mean of per-symbol prices, `(Π p_i)^(1/n)`.
    ///
    /// Computed as `exp(mean(ln p_i))` in f64 to avoid overflowing the product.
    /// A zero price makes the mean exactly zero; a negative price is rejected.
    pub fn geometric_mean<'a, I>(prices: I) -> Result<Decimal, ExchangeError>
    where
        I: IntoIterator<Item = (&'a str, Decimal)>,
    {
        let mut log_sum = 0.0_f64;
        let mut count = 0_usize;
        let mut has_zero = false;

        for (symbol, price) in prices {
            if price < Decimal::ZERO {
                warn!(
                    "Geometric mean refused: {} has negative volume weighted price {}",
                    symbol, price
                );
                return Err(ExchangeError::NegativePrice {
                    symbol: symbol.to_string(),
                    price,
                });
            }

            count += 1;
            if price.is_zero() {
                has_zero = true;
                continue;
            }

            let value = price.to_f64().ok_or_else(|| ExchangeError::NonFiniteResult {
                context: format!("price {} for {}", price, symbol),
            })?;
            log_sum += value.ln();
        }

        if count == 0 {
            return Err(ExchangeError::DivisionByZero {
                context: "geometric mean of zero prices".to_string(),
            });
        }

        if has_zero {
            return Ok(Decimal::ZERO);
        }

        let mean = (log_sum / count as f64).exp();
        Decimal::from_f64(mean).ok_or_else(|| ExchangeError::NonFiniteResult {
            context: format!("geometric mean {} over {} prices", mean, count),
        })
    }
}
