use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use foodlog_core::models::CalorieRecord;
use foodlog_core::render::format_quantity;

/// Parse a servings count like "1", "1.5" or "2x".
pub(crate) fn parse_servings(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches(['x', 'X']).trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid servings: '{s}'. Use a number like '1' or '1.5'"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Servings must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today()),
        Some(s) => match s.as_str() {
            "today" => Ok(today()),
            "yesterday" => Ok(today() - chrono::Duration::days(1)),
            "tomorrow" => Ok(today() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Parse an inclusive `from..=to` date pair, rejecting reversed ranges.
pub(crate) fn parse_date_range(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = parse_date(Some(from.to_string()))?;
    let end = parse_date(Some(to.to_string()))?;
    if start > end {
        bail!("Start date {start} is after end date {end}");
    }
    Ok((start, end))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing id or name and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn print_calorie_table(records: &[CalorieRecord]) {
    #[derive(Tabled)]
    struct CalorieRow {
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Cal/serving")]
        calories: u32,
    }

    let rows: Vec<CalorieRow> = records
        .iter()
        .map(|r| CalorieRow {
            name: r.food_name.clone(),
            category: r.category.to_string(),
            calories: r.calories_per_serving,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// "2.0 servings", "1 serving"-style label used in one-line confirmations.
pub(crate) fn servings_label(qty: f64) -> String {
    let unit = if (qty - 1.0).abs() < f64::EPSILON {
        "serving"
    } else {
        "servings"
    };
    format!("{} {unit}", format_quantity(qty))
}
