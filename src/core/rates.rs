//! Exchange rate abstractions and conversion math

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange rate of one currency against the configured base currency.
///
/// `ratio` is the number of units of `code` per one unit of the base, the
/// direction rate services quote. Records are replaced wholesale on refresh;
/// `fetched_at` drives the freshness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub code: String,
    pub ratio: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl Rate {
    pub fn new(code: impl Into<String>, ratio: Decimal, fetched_at: DateTime<Utc>) -> Self {
        Rate {
            code: code.into(),
            ratio,
            fetched_at,
        }
    }

    /// Converts an amount in this rate's currency into the base currency.
    pub fn to_base(&self, amount: Decimal) -> Result<Decimal> {
        self.ensure_usable()?;
        amount
            .checked_div(self.ratio)
            .ok_or_else(|| anyhow!("Conversion overflow: {} / {}", amount, self.ratio))
    }

    /// Converts a base currency amount into this rate's currency.
    pub fn to_display(&self, amount: Decimal) -> Result<Decimal> {
        self.ensure_usable()?;
        amount
            .checked_mul(self.ratio)
            .ok_or_else(|| anyhow!("Conversion overflow: {} * {}", amount, self.ratio))
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.ratio <= Decimal::ZERO {
            bail!("Invalid exchange rate {} for {}", self.ratio, self.code);
        }
        Ok(())
    }
}

/// Storage for the current rate table, keyed by currency code.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<Rate>>;
    async fn all(&self) -> Result<Vec<Rate>>;
    async fn upsert(&self, rate: Rate) -> Result<()>;
}

/// Source of fresh exchange rates.
///
/// Implementations return a record for every requested code they can quote,
/// plus the base currency itself at ratio one so that base amounts convert
/// through the same table.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self, base: &str, codes: &[String]) -> Result<Vec<Rate>>;
}
