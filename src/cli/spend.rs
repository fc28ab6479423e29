use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::ui;
use crate::core::expense::NewExpense;
use crate::core::tracker::ExpenseTracker;
use crate::core::user::UserId;

/// Records an expense and prints what is left of each configured budget.
pub async fn run(
    tracker: &ExpenseTracker,
    user: UserId,
    amount: Decimal,
    category: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    // Backdated expenses keep the current time of day, so two entries for
    // the same date stay distinguishable.
    let spent_at = match date {
        Some(date) => date.and_time(Utc::now().time()).and_utc(),
        None => Utc::now(),
    };

    let pb = ui::new_spinner("Recording expense...");
    let result = tracker
        .add_expense(
            user,
            NewExpense {
                category: category.to_string(),
                amount,
                spent_at,
            },
        )
        .await;
    pb.finish_and_clear();
    let outcome = result?;

    println!(
        "Recorded {} on {}.",
        ui::format_money(amount, &outcome.currency),
        category
    );

    if outcome.remaining.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No spend limits set. Use `outlay limit` to add one.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    for (interval, left) in &outcome.remaining {
        let label = ui::interval_label(*interval);
        if *left >= Decimal::ZERO {
            println!(
                "{} budget left: {}",
                label,
                ui::style_text(
                    &ui::format_money(*left, &outcome.currency),
                    ui::StyleType::TotalValue
                )
            );
        } else {
            println!(
                "{}",
                ui::style_text(
                    &format!(
                        "{} budget exceeded by {}",
                        label,
                        ui::format_money(left.abs(), &outcome.currency)
                    ),
                    ui::StyleType::Error
                )
            );
        }
    }
    Ok(())
}
