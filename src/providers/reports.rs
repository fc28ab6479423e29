use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::expense::ExpenseStore;
use crate::core::report::{Report, ReportProvider, ReportQuery};

/// Builds spending reports by aggregating the expense store directly, with
/// no service round trip.
pub struct LocalReports {
    expenses: Arc<dyn ExpenseStore>,
}

impl LocalReports {
    pub fn new(expenses: Arc<dyn ExpenseStore>) -> Self {
        LocalReports { expenses }
    }
}

#[async_trait]
impl ReportProvider for LocalReports {
    #[instrument(
        name = "ReportBuild",
        skip(self),
        fields(user = %query.user, interval = %query.interval, date = %query.date)
    )]
    async fn fetch_report(&self, query: &ReportQuery) -> Result<Report> {
        let (from, to) = query.interval.window_utc(query.date);
        let expenses = self
            .expenses
            .between(query.user, from, to)
            .await
            .context("Failed to read expenses for the report")?;
        debug!("Aggregating {} expenses", expenses.len());

        let mut totals = BTreeMap::new();
        for expense in expenses {
            *totals.entry(expense.category).or_insert(Decimal::ZERO) += expense.amount;
        }
        Ok(Report { totals })
    }
}
