//! Categories command

use anyhow::Result;
use serde::Serialize;
use spendlog_core::Category;

use super::print_json;
use crate::output;

#[derive(Serialize)]
struct CategoryRow {
    key: &'static str,
    alias: &'static str,
    label: &'static str,
}

pub fn run(json: bool) -> Result<()> {
    let rows: Vec<CategoryRow> = Category::ALL
        .iter()
        .map(|c| CategoryRow {
            key: c.as_str(),
            alias: c.alias(),
            label: c.label(),
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    let mut table = output::create_table();
    table.set_header(vec!["Key", "Alias", "Label"]);
    for row in &rows {
        table.add_row(vec![row.key, row.alias, row.label]);
    }
    println!("{}", table);
    Ok(())
}
