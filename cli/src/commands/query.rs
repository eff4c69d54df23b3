use anyhow::{Result, bail};

use foodlog_core::db::{Database, LogQuery};
use foodlog_core::render::TabularRenderer;

use super::helpers::{parse_date, parse_date_range};

fn print_rows(
    db: &Database,
    renderer: &TabularRenderer,
    query: &LogQuery,
    json: bool,
) -> Result<()> {
    if json {
        let rows = db.fetch_log_rows(query)?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", db.render_log_rows(query, renderer)?);
    }
    Ok(())
}

pub(crate) fn cmd_day(
    db: &Database,
    renderer: &TabularRenderer,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    print_rows(db, renderer, &LogQuery::Date(date), json)
}

pub(crate) fn cmd_range(
    db: &Database,
    renderer: &TabularRenderer,
    from: &str,
    to: &str,
    json: bool,
) -> Result<()> {
    let (start, end) = parse_date_range(from, to)?;
    print_rows(db, renderer, &LogQuery::DateRange { start, end }, json)
}

pub(crate) fn cmd_search(
    db: &Database,
    renderer: &TabularRenderer,
    text: &str,
    json: bool,
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Search text must not be empty");
    }
    print_rows(db, renderer, &LogQuery::FoodName(text.to_string()), json)
}
