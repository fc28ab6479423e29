//! Spend reports and the report delegate seam

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::interval::Interval;
use crate::core::user::UserId;

/// Identifies one report request: a user, a calendar date and the window
/// around it. Doubles as the report cache key, so equal queries always
/// address the same cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportQuery {
    pub user: UserId,
    pub date: NaiveDate,
    pub interval: Interval,
}

/// Spend totals per category, in the base currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub totals: BTreeMap<String, Decimal>,
}

impl Report {
    pub fn total(&self) -> Decimal {
        self.totals.values().copied().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Produces the report body for a query. The orchestrator treats the result
/// as opaque; it only caches and returns it.
#[async_trait]
pub trait ReportProvider: Send + Sync {
    async fn fetch_report(&self, query: &ReportQuery) -> Result<Report>;
}
