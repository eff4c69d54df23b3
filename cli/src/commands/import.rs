use std::path::Path;

use anyhow::{Context, Result};

use foodlog_core::calorie_import::{import_calorie_records, parse_calorie_csv};
use foodlog_core::db::Database;

pub(crate) fn cmd_food_import(db: &Database, path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let records = parse_calorie_csv(file)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    if records.is_empty() {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "No rows found in CSV file" })
            );
        } else {
            eprintln!("No rows found in CSV file.");
        }
        return Ok(());
    }

    let summary = import_calorie_records(db, &records, dry_run)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if dry_run {
        println!("Dry run, no changes made.\n");
        println!("  Rows parsed:     {}", summary.rows_parsed);
        println!("  Foods to add:    {}", summary.records_created);
        println!("  Already present: {}", summary.records_skipped);
    } else {
        println!("Import complete.\n");
        println!("  Rows parsed:     {}", summary.rows_parsed);
        println!("  Foods added:     {}", summary.records_created);
        println!("  Already present: {}", summary.records_skipped);
    }

    Ok(())
}
