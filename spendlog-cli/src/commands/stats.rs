//! Stats command - spending totals for the current period

use anyhow::Result;
use colored::Colorize;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use spendlog_core::StatsPeriod;

use super::{gate, get_context, print_json, surface, Globals};
use crate::output;

pub async fn run(globals: &Globals, period: &str, json: bool) -> Result<()> {
    // Unrecognized periods fall back to the month
    let period = StatsPeriod::from_keyword(period);

    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;
    let stats = surface(ctx.expense_service.get_stats(user.id, period).await)?;

    if json {
        return print_json(&stats);
    }

    println!(
        "{} {}",
        headline(stats.period).bold(),
        format!(
            "({} to {})",
            stats.start.format("%Y-%m-%d"),
            stats.end.format("%Y-%m-%d")
        )
        .dimmed()
    );
    println!(
        "  Total: {}  across {} expense(s)",
        output::format_amount(stats.total).bold(),
        stats.count
    );

    if stats.count == 0 {
        output::info("No expenses in this period");
        return Ok(());
    }

    println!();
    let mut table = output::create_table();
    table.set_header(vec!["Category", "Count", "Total", "Share"]);
    for entry in &stats.by_category {
        let share = if stats.total.is_zero() {
            0.0
        } else {
            (entry.total / stats.total * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        };
        table.add_row(vec![
            entry.category.label().to_string(),
            entry.count.to_string(),
            output::format_amount(entry.total),
            format!("{:.1}%", share),
        ]);
    }
    for column in 1..=3 {
        output::align_right(&mut table, column);
    }
    println!("{}", table);

    println!();
    let mut trend = output::create_table();
    trend.set_header(vec!["Date", "Total"]);
    for day in &stats.daily_trend {
        trend.add_row(vec![day.date.to_string(), output::format_amount(day.total)]);
    }
    output::align_right(&mut trend, 1);
    println!("{}", trend);

    Ok(())
}

fn headline(period: StatsPeriod) -> &'static str {
    match period {
        StatsPeriod::Day => "Today",
        StatsPeriod::Week => "This week",
        StatsPeriod::Month => "This month",
    }
}
