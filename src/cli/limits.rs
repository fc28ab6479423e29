use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use rust_decimal::Decimal;

use super::ui;
use crate::core::interval::Interval;
use crate::core::tracker::ExpenseTracker;
use crate::core::user::UserId;

/// Stores a spend ceiling for one window.
pub async fn run_set(
    tracker: &ExpenseTracker,
    user: UserId,
    interval: Interval,
    amount: Decimal,
) -> Result<()> {
    let currency = tracker.set_limit(user, interval, amount).await?;
    println!(
        "{} limit set to {}",
        ui::interval_label(interval),
        ui::format_money(amount, &currency)
    );
    Ok(())
}

/// Shows every window's ceiling and what is left of it today.
pub async fn run_show(tracker: &ExpenseTracker, user: UserId) -> Result<()> {
    let view = tracker.get_limits(user, Utc::now().date_naive()).await?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Window"),
        ui::header_cell(&format!("Limit ({})", view.currency)),
        ui::header_cell("Remaining"),
    ]);

    for (interval, entry) in &view.entries {
        let ceiling = if entry.ceiling > Decimal::ZERO {
            ui::money_cell(entry.ceiling)
        } else {
            ui::na_cell()
        };
        let remaining = match entry.remaining {
            Some(left) => ui::remaining_cell(left),
            None => ui::na_cell(),
        };
        table.add_row(vec![
            Cell::new(ui::interval_label(*interval)),
            ceiling,
            remaining,
        ]);
    }

    println!("{table}");
    Ok(())
}
