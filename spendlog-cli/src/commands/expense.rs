//! Expense commands - add, list, show, edit, delete

use anyhow::{anyhow, Result};
use colored::Colorize;
use dialoguer::Confirm;
use rust_decimal::Decimal;
use spendlog_core::{Expense, ExpenseId, ExpensePatch, ExpenseQuery, NewExpense};

use super::{gate, get_context, print_json, surface, Globals};
use crate::output;

fn parse_amount(raw: &str) -> Result<Decimal> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("Invalid amount: {}", raw))
}

fn parse_id(raw: &str) -> Result<ExpenseId> {
    raw.parse()
        .map_err(|_| anyhow!("Invalid expense ID: {}", raw))
}

pub async fn add(
    globals: &Globals,
    amount: &str,
    category: String,
    date: String,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let amount = parse_amount(amount)?;
    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;

    let expense = surface(
        ctx.expense_service
            .create(user.id, NewExpense::new(amount, category, date, note))
            .await,
    )?;

    if json {
        return print_json(&expense);
    }
    output::success("Expense recorded");
    print_expense(&expense);
    Ok(())
}

pub async fn list(globals: &Globals, query: ExpenseQuery, json: bool) -> Result<()> {
    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;

    let filter = query.into_filter(user.id, &ctx.config.query_limits);
    let page = surface(ctx.expense_service.get_all(&filter).await)?;

    if json {
        return print_json(&page);
    }

    if page.expenses.is_empty() {
        output::info("No expenses found");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Date", "Category", "Amount", "Note"]);
    for expense in &page.expenses {
        table.add_row(vec![
            expense.id.to_string(),
            expense.date.to_string(),
            expense.category.label().to_string(),
            output::format_amount(expense.amount),
            expense.note.clone().unwrap_or_default(),
        ]);
    }
    output::align_right(&mut table, 3);
    println!("{}", table);

    let first = u64::from(filter.offset) + 1;
    let last = u64::from(filter.offset) + page.expenses.len() as u64;
    println!(
        "{}",
        format!("Showing {}-{} of {}", first, last, page.total).dimmed()
    );
    Ok(())
}

pub async fn show(globals: &Globals, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;

    let expense = surface(ctx.expense_service.get_by_id(id, user.id).await)?;

    if json {
        return print_json(&expense);
    }
    print_expense(&expense);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn edit(
    globals: &Globals,
    id: &str,
    amount: Option<String>,
    category: Option<String>,
    date: Option<String>,
    note: Option<Option<String>>,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    let patch = ExpensePatch {
        amount: amount.as_deref().map(parse_amount).transpose()?,
        category,
        date,
        note,
    };

    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;
    let expense = surface(ctx.expense_service.update(id, user.id, patch).await)?;

    if json {
        return print_json(&expense);
    }
    output::success("Expense updated");
    print_expense(&expense);
    Ok(())
}

pub async fn delete(globals: &Globals, id: &str, force: bool) -> Result<()> {
    let id = parse_id(id)?;
    let ctx = get_context(globals)?;
    let user = gate(&ctx, globals).await?;

    // Show what is about to go, and fail early on a foreign or missing ID
    let expense = surface(ctx.expense_service.get_by_id(id, user.id).await)?;

    if !force {
        print_expense(&expense);
        if !Confirm::new()
            .with_prompt("Delete this expense?")
            .default(false)
            .interact()?
        {
            output::warning("Cancelled");
            return Ok(());
        }
    }

    surface(ctx.expense_service.delete(id, user.id).await)?;
    output::success("Expense deleted");
    Ok(())
}

fn print_expense(expense: &Expense) {
    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), expense.id.to_string()]);
    table.add_row(vec!["Date".to_string(), expense.date.to_string()]);
    table.add_row(vec![
        "Category".to_string(),
        format!("{} ({})", expense.category.label(), expense.category),
    ]);
    table.add_row(vec!["Amount".to_string(), output::format_amount(expense.amount)]);
    if let Some(note) = &expense.note {
        table.add_row(vec!["Note".to_string(), note.clone()]);
    }
    table.add_row(vec![
        "Updated".to_string(),
        expense.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ]);
    println!("{}", table);
}
