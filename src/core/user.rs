//! User identity and budget preferences

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::core::interval::Interval;

/// Stable identifier for a tracked profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spend ceilings per window, stored in the base currency. A ceiling of zero
/// or less means the window has no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub day: Decimal,
    pub week: Decimal,
    pub month: Decimal,
}

impl Limits {
    pub fn ceiling(&self, interval: Interval) -> Decimal {
        match interval {
            Interval::Day => self.day,
            Interval::Week => self.week,
            Interval::Month => self.month,
        }
    }
}

/// Storage for per-user preferences and ceilings.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Preferred display currency; `None` when the user never picked one.
    async fn default_currency(&self, user: UserId) -> Result<Option<String>>;

    async fn set_default_currency(&self, user: UserId, code: &str) -> Result<()>;

    /// Stored ceilings; a user with no record reads as all zeroes.
    async fn limits(&self, user: UserId) -> Result<Limits>;

    async fn set_limit(&self, user: UserId, interval: Interval, ceiling: Decimal) -> Result<()>;
}
