//! Expense records and their storage seam

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::user::UserId;

/// A recorded expense. `amount` is in the base currency; records are never
/// mutated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub category: String,
    pub amount: Decimal,
    pub spent_at: DateTime<Utc>,
}

/// An expense as entered, still priced in the user's display currency.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category: String,
    pub amount: Decimal,
    pub spent_at: DateTime<Utc>,
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn create(&self, user: UserId, expense: Expense) -> Result<()>;

    /// Expenses with `spent_at` inside the half-open range `[from, to)`,
    /// oldest first.
    async fn between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Expense>>;
}
