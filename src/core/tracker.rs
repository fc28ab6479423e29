//! Expense tracking orchestration: rate freshness, conversion, limits and
//! report caching over the injected stores and providers.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::cache::LruCache;
use crate::core::expense::{Expense, ExpenseStore, NewExpense};
use crate::core::interval::Interval;
use crate::core::rates::{Rate, RateProvider, RateStore};
use crate::core::report::{Report, ReportProvider, ReportQuery};
use crate::core::user::{UserId, UserStore};

/// Orchestrator tuning, projected from the application config.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Currency all amounts are stored in.
    pub base_currency: String,
    /// Display currencies users may pick, beyond the base.
    pub currencies: Vec<String>,
    /// How long a fetched rate table stays fresh.
    pub refresh_after: Duration,
    /// Report cache tuning; `None` disables caching entirely.
    pub report_cache: Option<ReportCacheSettings>,
}

#[derive(Debug, Clone)]
pub struct ReportCacheSettings {
    pub capacity: usize,
    pub ttl: Duration,
}

/// Remaining allowance per limited window after an expense was recorded.
#[derive(Debug, Clone)]
pub struct SpendOutcome {
    /// Currency the remaining amounts are expressed in.
    pub currency: String,
    pub remaining: BTreeMap<Interval, Decimal>,
}

/// One window's budget as presented to the user.
#[derive(Debug, Clone)]
pub struct LimitEntry {
    pub ceiling: Decimal,
    /// Allowance left in the current window; `None` when no limit is set.
    pub remaining: Option<Decimal>,
}

/// All budgets converted to the user's display currency.
#[derive(Debug, Clone)]
pub struct LimitsView {
    pub currency: String,
    pub entries: BTreeMap<Interval, LimitEntry>,
}

struct ReportCache {
    entries: LruCache<ReportQuery, Report>,
    ttl: Duration,
}

/// Coordinates the expense flows: keeps exchange rates fresh on demand,
/// converts between display and base currency, evaluates spend limits and
/// caches reports with invalidation on writes.
///
/// All methods take `&self` and are safe to call concurrently; the report
/// cache is the only internal mutable state and owns its lock.
pub struct ExpenseTracker {
    rates: Arc<dyn RateStore>,
    users: Arc<dyn UserStore>,
    expenses: Arc<dyn ExpenseStore>,
    rate_provider: Arc<dyn RateProvider>,
    report_provider: Arc<dyn ReportProvider>,
    cache: Option<ReportCache>,
    settings: TrackerSettings,
}

impl ExpenseTracker {
    pub fn new(
        rates: Arc<dyn RateStore>,
        users: Arc<dyn UserStore>,
        expenses: Arc<dyn ExpenseStore>,
        rate_provider: Arc<dyn RateProvider>,
        report_provider: Arc<dyn ReportProvider>,
        settings: TrackerSettings,
    ) -> Self {
        let cache = settings.report_cache.as_ref().map(|cache| ReportCache {
            entries: LruCache::new(cache.capacity),
            ttl: cache.ttl,
        });

        ExpenseTracker {
            rates,
            users,
            expenses,
            rate_provider,
            report_provider,
            cache,
            settings,
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.settings.base_currency
    }

    /// Sets the user's display currency. Only the base currency and the
    /// configured codes are accepted.
    #[instrument(name = "SetCurrency", skip(self), fields(user = %user, code = %code))]
    pub async fn set_default_currency(&self, user: UserId, code: &str) -> Result<()> {
        if !self.is_supported(code) {
            bail!(
                "Unsupported currency: {} (supported: {})",
                code,
                self.supported_codes().join(", ")
            );
        }

        self.users
            .set_default_currency(user, code)
            .await
            .context("Failed to store default currency")?;
        info!("Default currency set to {}", code);
        Ok(())
    }

    /// Sets one window's spend ceiling, taking the amount in the user's
    /// display currency. Returns the currency the amount was read in.
    #[instrument(name = "SetLimit", skip(self), fields(user = %user, interval = %interval))]
    pub async fn set_limit(
        &self,
        user: UserId,
        interval: Interval,
        amount: Decimal,
    ) -> Result<String> {
        let currency = self.display_currency(user).await?;
        let rate = self.stored_rate(&currency).await?;
        let ceiling = rate.to_base(amount)?;

        self.users
            .set_limit(user, interval, ceiling)
            .await
            .context("Failed to store limit")?;
        debug!(
            "Stored {} limit of {} {}",
            interval, ceiling, self.settings.base_currency
        );
        Ok(currency)
    }

    /// Reads the user's limits together with the allowance left in each
    /// window around `as_of`, everything in the display currency.
    #[instrument(name = "GetLimits", skip(self), fields(user = %user, as_of = %as_of))]
    pub async fn get_limits(&self, user: UserId, as_of: NaiveDate) -> Result<LimitsView> {
        let limits = self
            .users
            .limits(user)
            .await
            .context("Failed to read limits")?;
        let currency = self.display_currency(user).await?;
        let rate = self.stored_rate(&currency).await?;

        let mut entries = BTreeMap::new();
        for interval in Interval::ALL {
            let ceiling = limits.ceiling(interval);
            let remaining = match self.remaining_for(user, interval, as_of, ceiling).await? {
                Some(left) => Some(rate.to_display(left)?),
                None => None,
            };
            entries.insert(
                interval,
                LimitEntry {
                    ceiling: rate.to_display(ceiling)?,
                    remaining,
                },
            );
        }

        Ok(LimitsView { currency, entries })
    }

    /// Records an expense taken in the user's display currency and reports
    /// the allowance left in each limited window.
    ///
    /// Cached reports for the expense date are invalidated up front, so a
    /// failure later in the flow can only cost a rebuild, never serve a
    /// stale report.
    #[instrument(
        name = "AddExpense",
        skip(self, expense),
        fields(user = %user, category = %expense.category)
    )]
    pub async fn add_expense(&self, user: UserId, expense: NewExpense) -> Result<SpendOutcome> {
        if expense.amount <= Decimal::ZERO {
            bail!(
                "Invalid expense amount: {} (must be positive)",
                expense.amount
            );
        }

        let date = expense.spent_at.date_naive();
        self.invalidate_reports(user, date);

        self.ensure_fresh(false).await?;

        let currency = self.display_currency(user).await?;
        let rate = self.stored_rate(&currency).await?;
        let amount = rate.to_base(expense.amount)?;

        self.expenses
            .create(
                user,
                Expense {
                    category: expense.category.clone(),
                    amount,
                    spent_at: expense.spent_at,
                },
            )
            .await
            .context("Failed to record expense")?;
        info!(
            "Recorded {} {} against {}",
            amount, self.settings.base_currency, expense.category
        );

        let limits = self
            .users
            .limits(user)
            .await
            .context("Failed to read limits")?;
        let mut remaining = BTreeMap::new();
        for interval in Interval::ALL {
            let ceiling = limits.ceiling(interval);
            if let Some(left) = self.remaining_for(user, interval, date, ceiling).await? {
                remaining.insert(interval, rate.to_display(left)?);
            }
        }

        Ok(SpendOutcome {
            currency,
            remaining,
        })
    }

    /// Produces a report, serving it from the cache when possible. Only
    /// successful delegate responses are cached.
    #[instrument(
        name = "GetReport",
        skip(self),
        fields(user = %query.user, interval = %query.interval, date = %query.date)
    )]
    pub async fn get_report(&self, query: ReportQuery) -> Result<Report> {
        if let Some(cache) = &self.cache {
            if let Some(report) = cache.entries.get(Utc::now(), &query) {
                return Ok(report);
            }
        }

        let report = self
            .report_provider
            .fetch_report(&query)
            .await
            .context("Failed to build report")?;

        if let Some(cache) = &self.cache {
            cache.entries.put(Utc::now(), query, report.clone(), cache.ttl);
        }
        Ok(report)
    }

    /// Fetches fresh rates regardless of the stored table's age.
    #[instrument(name = "RefreshRates", skip(self))]
    pub async fn refresh_rates(&self) -> Result<()> {
        self.ensure_fresh(true).await
    }

    /// The stored rate table, ordered by currency code.
    pub async fn current_rates(&self) -> Result<Vec<Rate>> {
        let mut rates = self
            .rates
            .all()
            .await
            .context("Failed to read stored rates")?;
        rates.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rates)
    }

    async fn ensure_fresh(&self, force: bool) -> Result<()> {
        if !force && !self.needs_refresh().await {
            debug!("Stored rates are fresh enough");
            return Ok(());
        }

        debug!(
            "Fetching exchange rates for base {}",
            self.settings.base_currency
        );
        let rates = self
            .rate_provider
            .fetch_rates(&self.settings.base_currency, &self.settings.currencies)
            .await
            .context("Failed to fetch exchange rates")?;
        for rate in rates {
            self.rates
                .upsert(rate)
                .await
                .context("Failed to store exchange rate")?;
        }
        Ok(())
    }

    /// A missing or unreadable base record counts as stale, so the first run
    /// populates the table through the ordinary refresh path.
    async fn needs_refresh(&self) -> bool {
        let base = match self.rates.get(&self.settings.base_currency).await {
            Ok(Some(rate)) => rate,
            Ok(None) => return true,
            Err(error) => {
                warn!("Could not read stored rates, treating them as stale: {}", error);
                return true;
            }
        };

        Utc::now().signed_duration_since(base.fetched_at) > self.settings.refresh_after
    }

    /// The user's display currency, falling back to the base when none was
    /// ever picked. A store failure still propagates.
    async fn display_currency(&self, user: UserId) -> Result<String> {
        let currency = self
            .users
            .default_currency(user)
            .await
            .context("Failed to read default currency")?;
        Ok(currency.unwrap_or_else(|| self.settings.base_currency.clone()))
    }

    async fn stored_rate(&self, code: &str) -> Result<Rate> {
        self.rates
            .get(code)
            .await
            .context("Failed to read stored rates")?
            .ok_or_else(|| anyhow!("No exchange rate stored for {}; run a rate refresh first", code))
    }

    /// Base currency allowance left in the window around `as_of`. `None`
    /// when the ceiling is unset; negative when the window is over budget.
    async fn remaining_for(
        &self,
        user: UserId,
        interval: Interval,
        as_of: NaiveDate,
        ceiling: Decimal,
    ) -> Result<Option<Decimal>> {
        if ceiling <= Decimal::ZERO {
            return Ok(None);
        }

        let (from, to) = interval.window_utc(as_of);
        let spent: Decimal = self
            .expenses
            .between(user, from, to)
            .await
            .with_context(|| format!("Failed to read expenses for the {} window", interval))?
            .iter()
            .map(|expense| expense.amount)
            .sum();

        Ok(Some(ceiling - spent))
    }

    fn invalidate_reports(&self, user: UserId, date: NaiveDate) {
        let Some(cache) = &self.cache else {
            return;
        };
        for interval in Interval::ALL {
            cache.entries.remove(&ReportQuery {
                user,
                date,
                interval,
            });
        }
    }

    fn is_supported(&self, code: &str) -> bool {
        code == self.settings.base_currency
            || self.settings.currencies.iter().any(|supported| supported == code)
    }

    fn supported_codes(&self) -> Vec<String> {
        let mut codes = vec![self.settings.base_currency.clone()];
        codes.extend(self.settings.currencies.iter().cloned());
        codes
    }
}
