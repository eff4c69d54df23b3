use anyhow::Result;

use foodlog_core::db::Database;
use foodlog_core::models::{CalorieRecord, validate_category};
use foodlog_core::render::NO_RESULTS;

use super::helpers::{exit_not_found, print_calorie_table};

pub(crate) fn cmd_food_add(
    db: &Database,
    name: &str,
    calories: u32,
    category: &str,
    json: bool,
) -> Result<()> {
    let category = validate_category(category)?;
    let record = db.insert_calorie_record(&CalorieRecord {
        food_name: name.to_string(),
        calories_per_serving: calories,
        category,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let name = &record.food_name;
        let cal = record.calories_per_serving;
        let category = record.category;
        println!("Added food: {name} ({cal} kcal per serving, {category})");
    }
    Ok(())
}

pub(crate) fn cmd_food_delete(db: &Database, name: &str, json: bool) -> Result<()> {
    if !db.delete_calorie_record(name)? {
        exit_not_found(&format!("Food '{name}' is not in the calorie table"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": name.trim().to_lowercase() }));
    } else {
        println!("Deleted food: {}", name.trim().to_lowercase());
    }
    Ok(())
}

pub(crate) fn cmd_food_list(db: &Database, json: bool) -> Result<()> {
    let records = db.all_calorie_records()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("{NO_RESULTS}");
    } else {
        print_calorie_table(&records);
    }
    Ok(())
}
