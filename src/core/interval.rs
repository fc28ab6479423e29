//! Budgeting and reporting windows

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Interval {
    Day,
    Week,
    Month,
}

impl Interval {
    pub const ALL: [Interval; 3] = [Interval::Day, Interval::Week, Interval::Month];

    /// Calendar window containing `date`, as a half-open `[start, end)` pair.
    /// Weeks start on Monday; months cover the calendar month.
    pub fn window(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Interval::Day => (date, date + Days::new(1)),
            Interval::Week => {
                let start = date.week(Weekday::Mon).first_day();
                (start, start + Days::new(7))
            }
            Interval::Month => {
                let start = date - Days::new(u64::from(date.day0()));
                (start, start + Months::new(1))
            }
        }
    }

    /// The same window as midnight-aligned UTC instants.
    pub fn window_utc(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let (start, end) = self.window(date);
        (
            start.and_time(NaiveTime::MIN).and_utc(),
            end.and_time(NaiveTime::MIN).and_utc(),
        )
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Interval::Day => "day",
                Interval::Week => "week",
                Interval::Month => "month",
            }
        )
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Interval::Day),
            "week" => Ok(Interval::Week),
            "month" => Ok(Interval::Month),
            _ => Err(anyhow::anyhow!(
                "Invalid interval: {} (expected day, week or month)",
                s
            )),
        }
    }
}
