//! In-memory store implementations. The test suites lean on these; they also
//! pin the reference semantics the disk store has to match.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::core::expense::{Expense, ExpenseStore};
use crate::core::interval::Interval;
use crate::core::rates::{Rate, RateStore};
use crate::core::user::{Limits, UserId, UserStore};

#[derive(Default)]
pub struct MemoryRates {
    rates: Mutex<HashMap<String, Rate>>,
}

impl MemoryRates {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateStore for MemoryRates {
    async fn get(&self, code: &str) -> Result<Option<Rate>> {
        let rates = self.rates.lock().await;
        Ok(rates.get(code).cloned())
    }

    async fn all(&self) -> Result<Vec<Rate>> {
        let rates = self.rates.lock().await;
        Ok(rates.values().cloned().collect())
    }

    async fn upsert(&self, rate: Rate) -> Result<()> {
        let mut rates = self.rates.lock().await;
        rates.insert(rate.code.clone(), rate);
        Ok(())
    }
}

#[derive(Default, Clone)]
struct UserRecord {
    currency: Option<String>,
    limits: Limits,
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn default_currency(&self, user: UserId) -> Result<Option<String>> {
        let users = self.users.lock().await;
        Ok(users.get(&user).and_then(|record| record.currency.clone()))
    }

    async fn set_default_currency(&self, user: UserId, code: &str) -> Result<()> {
        let mut users = self.users.lock().await;
        users.entry(user).or_default().currency = Some(code.to_string());
        Ok(())
    }

    async fn limits(&self, user: UserId) -> Result<Limits> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user)
            .map(|record| record.limits)
            .unwrap_or_default())
    }

    async fn set_limit(&self, user: UserId, interval: Interval, amount: Decimal) -> Result<()> {
        let mut users = self.users.lock().await;
        let limits = &mut users.entry(user).or_default().limits;
        match interval {
            Interval::Day => limits.day = amount,
            Interval::Week => limits.week = amount,
            Interval::Month => limits.month = amount,
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryExpenses {
    expenses: Mutex<HashMap<UserId, Vec<Expense>>>,
}

impl MemoryExpenses {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseStore for MemoryExpenses {
    async fn create(&self, user: UserId, expense: Expense) -> Result<()> {
        let mut expenses = self.expenses.lock().await;
        expenses.entry(user).or_default().push(expense);
        Ok(())
    }

    async fn between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Expense>> {
        let expenses = self.expenses.lock().await;
        let mut matching: Vec<Expense> = expenses
            .get(&user)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|expense| expense.spent_at >= from && expense.spent_at < to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matching.sort_by_key(|expense| expense.spent_at);
        Ok(matching)
    }
}
