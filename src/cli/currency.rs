use anyhow::Result;
use comfy_table::Cell;

use super::ui;
use crate::core::tracker::ExpenseTracker;
use crate::core::user::UserId;

/// Sets the user's display currency.
pub async fn run_set(tracker: &ExpenseTracker, user: UserId, code: &str) -> Result<()> {
    tracker.set_default_currency(user, code).await?;
    println!("Default currency set to {code}");
    Ok(())
}

/// Forces a rate refresh and shows the stored table.
pub async fn run_refresh(tracker: &ExpenseTracker) -> Result<()> {
    let pb = ui::new_spinner("Refreshing exchange rates...");
    let result = tracker.refresh_rates().await;
    pb.finish_and_clear();
    result?;

    let rates = tracker.current_rates().await?;
    let base = tracker.base_currency();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (per {base})")),
        ui::header_cell("Fetched"),
    ]);
    for rate in &rates {
        table.add_row(vec![
            Cell::new(&rate.code),
            Cell::new(format!("{:.4}", rate.ratio)),
            Cell::new(rate.fetched_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}
