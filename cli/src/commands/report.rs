use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use foodlog_core::db::{Database, LogQuery};
use foodlog_core::report::Report;

use super::helpers::{no_neg_zero, parse_date, parse_date_range, today};
use crate::ReportCommands;

#[derive(Serialize)]
struct ReportOutput<'a> {
    period: String,
    #[serde(flatten)]
    report: &'a Report,
    calories_per_meal: f64,
}

pub(crate) fn cmd_report(db: &Database, command: ReportCommands) -> Result<()> {
    let (query, json) = match command {
        ReportCommands::Yesterday { json } => (LogQuery::yesterday(today()), json),
        ReportCommands::Date { date, json } => (LogQuery::Date(parse_date(Some(date))?), json),
        ReportCommands::Range { from, to, json } => {
            let (start, end) = parse_date_range(&from, &to)?;
            (LogQuery::DateRange { start, end }, json)
        }
        ReportCommands::Days { days, json } => (LogQuery::last_days(days, today()), json),
    };

    let report = db.build_report(&query)?;

    if json {
        let output = ReportOutput {
            period: query.to_string(),
            report: &report,
            calories_per_meal: no_neg_zero(report.calories_per_meal()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&query, &report);
    Ok(())
}

fn print_report(query: &LogQuery, report: &Report) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Count")]
        count: u32,
    }

    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Servings")]
        servings: String,
    }

    println!("=== Report: {query} ===\n");
    let total = no_neg_zero(report.total_calories());
    let meals = report.meal_count();
    let per_meal = no_neg_zero(report.calories_per_meal());
    println!("  Total calories:    {total:.0}");
    println!("  Meals:             {meals}");
    println!("  Calories per meal: {per_meal:.0}\n");

    let meal_rows: Vec<MealRow> = report
        .meal_type_count()
        .iter()
        .map(|(meal, count)| MealRow {
            meal: meal.to_string(),
            count,
        })
        .collect();
    let table = Table::new(&meal_rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let category_rows: Vec<CategoryRow> = report
        .meal_category_count()
        .iter()
        .map(|(category, servings)| CategoryRow {
            category: category.to_string(),
            servings: format!("{:.1}", no_neg_zero(servings)),
        })
        .collect();
    let table = Table::new(&category_rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
