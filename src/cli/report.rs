use anyhow::Result;
use chrono::{Days, NaiveDate, Utc};
use comfy_table::Cell;

use super::ui;
use crate::core::interval::Interval;
use crate::core::report::ReportQuery;
use crate::core::tracker::ExpenseTracker;
use crate::core::user::UserId;

/// Prints a per-category spending report for the window around `date`.
pub async fn run(
    tracker: &ExpenseTracker,
    user: UserId,
    interval: Interval,
    date: Option<NaiveDate>,
) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let report = tracker
        .get_report(ReportQuery {
            user,
            date,
            interval,
        })
        .await?;

    let (from, to) = interval.window(date);
    let last_day = to - Days::new(1);
    let heading = if interval == Interval::Day {
        format!("Spending on {from}")
    } else {
        format!("Spending from {from} to {last_day}")
    };
    println!("{}\n", ui::style_text(&heading, ui::StyleType::Title));

    if report.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No expenses recorded in this window.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    let base = tracker.base_currency();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Total ({base})")),
    ]);
    for (category, total) in &report.totals {
        table.add_row(vec![Cell::new(category), ui::money_cell(*total)]);
    }
    println!("{table}");

    println!(
        "\n{} {}",
        ui::style_text(&format!("Total ({base}):"), ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", report.total()),
            ui::StyleType::TotalValue
        )
    );
    Ok(())
}
