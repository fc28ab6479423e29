//! Persistent store backed by a fjall keyspace. One partition per record
//! family: rates, users and expenses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::core::expense::{Expense, ExpenseStore};
use crate::core::interval::Interval;
use crate::core::rates::{Rate, RateStore};
use crate::core::user::{Limits, UserId, UserStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserRecord {
    currency: Option<String>,
    limits: Limits,
}

pub struct DiskStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    users: PartitionHandle,
    expenses: PartitionHandle,
    /// Disambiguates expenses inserted within the same microsecond.
    seq: AtomicU64,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        debug!("Opening data store at {}", path.display());

        let keyspace = fjall::Config::new(path)
            .open()
            .context("Failed to open the data store")?;
        let rates = keyspace.open_partition("rates", PartitionCreateOptions::default())?;
        let users = keyspace.open_partition("users", PartitionCreateOptions::default())?;
        let expenses = keyspace.open_partition("expenses", PartitionCreateOptions::default())?;

        Ok(DiskStore {
            keyspace,
            rates,
            users,
            expenses,
            seq: AtomicU64::new(0),
        })
    }

    fn flush(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn read_user(&self, user: UserId) -> Result<Option<UserRecord>> {
        match self.users.get(user.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_user(&self, user: UserId, record: &UserRecord) -> Result<()> {
        self.users
            .insert(user.0.to_be_bytes(), serde_json::to_vec(record)?)?;
        self.flush()
    }
}

#[async_trait]
impl RateStore for DiskStore {
    async fn get(&self, code: &str) -> Result<Option<Rate>> {
        match self.rates.get(code)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<Rate>> {
        let mut rates = Vec::new();
        for entry in self.rates.iter() {
            let (_, bytes) = entry?;
            rates.push(serde_json::from_slice(&bytes)?);
        }
        Ok(rates)
    }

    async fn upsert(&self, rate: Rate) -> Result<()> {
        self.rates
            .insert(rate.code.as_bytes(), serde_json::to_vec(&rate)?)?;
        self.flush()
    }
}

#[async_trait]
impl UserStore for DiskStore {
    async fn default_currency(&self, user: UserId) -> Result<Option<String>> {
        Ok(self.read_user(user)?.and_then(|record| record.currency))
    }

    async fn set_default_currency(&self, user: UserId, code: &str) -> Result<()> {
        let mut record = self.read_user(user)?.unwrap_or_default();
        record.currency = Some(code.to_string());
        self.write_user(user, &record)
    }

    async fn limits(&self, user: UserId) -> Result<Limits> {
        Ok(self
            .read_user(user)?
            .map(|record| record.limits)
            .unwrap_or_default())
    }

    async fn set_limit(&self, user: UserId, interval: Interval, ceiling: Decimal) -> Result<()> {
        let mut record = self.read_user(user)?.unwrap_or_default();
        match interval {
            Interval::Day => record.limits.day = ceiling,
            Interval::Week => record.limits.week = ceiling,
            Interval::Month => record.limits.month = ceiling,
        }
        self.write_user(user, &record)
    }
}

#[async_trait]
impl ExpenseStore for DiskStore {
    /// Keys are user id, insertion instant and a sequence number, so two
    /// expenses recorded for the same moment never overwrite each other.
    async fn create(&self, user: UserId, expense: Expense) -> Result<()> {
        let mut key = [0u8; 24];
        key[..8].copy_from_slice(&user.0.to_be_bytes());
        key[8..16].copy_from_slice(&(Utc::now().timestamp_micros() as u64).to_be_bytes());
        key[16..].copy_from_slice(&self.seq.fetch_add(1, Ordering::SeqCst).to_be_bytes());

        self.expenses.insert(key, serde_json::to_vec(&expense)?)?;
        self.flush()
    }

    async fn between(
        &self,
        user: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Expense>> {
        let mut matching = Vec::new();
        for entry in self.expenses.prefix(user.0.to_be_bytes()) {
            let (_, bytes) = entry?;
            let expense: Expense = serde_json::from_slice(&bytes)?;
            if expense.spent_at >= from && expense.spent_at < to {
                matching.push(expense);
            }
        }
        matching.sort_by_key(|expense| expense.spent_at);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_rates_survive_reopen() {
        let dir = tempdir().unwrap();

        let store = DiskStore::open(dir.path()).unwrap();
        store
            .upsert(Rate::new("EUR", dec!(0.9), at("2024-05-15T10:00:00Z")))
            .await
            .unwrap();
        drop(store);

        let store = DiskStore::open(dir.path()).unwrap();
        let rate = store.get("EUR").await.unwrap().unwrap();
        assert_eq!(rate.ratio, dec!(0.9));
        assert_eq!(rate.fetched_at, at("2024-05-15T10:00:00Z"));
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_record_round_trip() {
        let dir = tempdir().unwrap();
        let user = UserId(3);

        let store = DiskStore::open(dir.path()).unwrap();
        store.set_default_currency(user, "EUR").await.unwrap();
        store.set_limit(user, Interval::Day, dec!(50)).await.unwrap();
        drop(store);

        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(
            store.default_currency(user).await.unwrap(),
            Some("EUR".to_string())
        );
        let limits = store.limits(user).await.unwrap();
        assert_eq!(limits.day, dec!(50));
        assert_eq!(limits.week, Decimal::ZERO);
        // Setting a limit keeps the stored currency.
        store.set_limit(user, Interval::Week, dec!(200)).await.unwrap();
        assert_eq!(
            store.default_currency(user).await.unwrap(),
            Some("EUR".to_string())
        );
    }

    #[tokio::test]
    async fn test_expense_window_scans_one_user() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        for (user, amount, spent_at) in [
            (UserId(1), dec!(2), at("2024-05-15T18:00:00Z")),
            (UserId(1), dec!(1), at("2024-05-15T08:00:00Z")),
            (UserId(1), dec!(3), at("2024-05-16T00:00:00Z")),
            (UserId(2), dec!(9), at("2024-05-15T12:00:00Z")),
        ] {
            store
                .create(
                    user,
                    Expense {
                        category: "misc".to_string(),
                        amount,
                        spent_at,
                    },
                )
                .await
                .unwrap();
        }

        let expenses = store
            .between(
                UserId(1),
                at("2024-05-15T00:00:00Z"),
                at("2024-05-16T00:00:00Z"),
            )
            .await
            .unwrap();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].amount, dec!(1));
        assert_eq!(expenses[1].amount, dec!(2));
    }

    #[tokio::test]
    async fn test_expenses_for_the_same_instant_both_survive() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let spent_at = at("2024-05-15T00:00:00Z");

        for amount in [dec!(5), dec!(7)] {
            store
                .create(
                    UserId(1),
                    Expense {
                        category: "misc".to_string(),
                        amount,
                        spent_at,
                    },
                )
                .await
                .unwrap();
        }

        let expenses = store
            .between(
                UserId(1),
                at("2024-05-15T00:00:00Z"),
                at("2024-05-16T00:00:00Z"),
            )
            .await
            .unwrap();
        assert_eq!(expenses.len(), 2);
    }
}
