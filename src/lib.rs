pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::interval::Interval;
use crate::core::tracker::ExpenseTracker;
use crate::core::user::UserId;
use crate::providers::{FrankfurterProvider, LocalReports};
use crate::store::DiskStore;

/// The commands the application can execute once configuration is loaded.
pub enum AppCommand {
    Spend {
        amount: Decimal,
        category: String,
        date: Option<NaiveDate>,
    },
    SetLimit {
        interval: Interval,
        amount: Decimal,
    },
    Limits,
    Report {
        interval: Interval,
        date: Option<NaiveDate>,
    },
    SetCurrency {
        code: String,
    },
    RefreshRates,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    profile: Option<u64>,
) -> Result<()> {
    info!("Expense tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let user = UserId(profile.unwrap_or(config.profile));
    let tracker = build_tracker(&config)?;

    match command {
        AppCommand::Spend {
            amount,
            category,
            date,
        } => cli::spend::run(&tracker, user, amount, &category, date).await,
        AppCommand::SetLimit { interval, amount } => {
            cli::limits::run_set(&tracker, user, interval, amount).await
        }
        AppCommand::Limits => cli::limits::run_show(&tracker, user).await,
        AppCommand::Report { interval, date } => {
            cli::report::run(&tracker, user, interval, date).await
        }
        AppCommand::SetCurrency { code } => cli::currency::run_set(&tracker, user, &code).await,
        AppCommand::RefreshRates => cli::currency::run_refresh(&tracker).await,
    }
}

/// Wires the tracker to the on-disk stores and the configured providers.
pub fn build_tracker(config: &AppConfig) -> Result<ExpenseTracker> {
    let data_path = config.default_data_path()?;
    let store = Arc::new(DiskStore::open(&data_path.join("store"))?);

    let base_url = config
        .providers
        .frankfurter
        .as_ref()
        .map_or("https://api.frankfurter.dev", |p| &p.base_url);
    let rate_provider = Arc::new(FrankfurterProvider::new(base_url));
    let report_provider = Arc::new(LocalReports::new(store.clone()));

    Ok(ExpenseTracker::new(
        store.clone(),
        store.clone(),
        store,
        rate_provider,
        report_provider,
        config.tracker_settings(),
    ))
}
