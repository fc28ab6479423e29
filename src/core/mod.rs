//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod expense;
pub mod interval;
pub mod log;
pub mod rates;
pub mod report;
pub mod tracker;
pub mod user;

// Re-export main types for cleaner imports
pub use expense::{Expense, ExpenseStore, NewExpense};
pub use interval::Interval;
pub use rates::{Rate, RateProvider, RateStore};
pub use report::{Report, ReportProvider, ReportQuery};
pub use tracker::{ExpenseTracker, LimitsView, SpendOutcome, TrackerSettings};
pub use user::{Limits, UserId, UserStore};
