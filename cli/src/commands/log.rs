use anyhow::Result;

use foodlog_core::db::Database;
use foodlog_core::models::{NewLogRow, validate_meal_type};

use super::helpers::{parse_date, parse_servings, servings_label};

pub(crate) fn cmd_log(
    db: &Database,
    food: &str,
    servings: &str,
    meal: &str,
    date: Option<String>,
    notes: &str,
    json: bool,
) -> Result<()> {
    let meal_type = validate_meal_type(meal)?;
    let serving_quantity = parse_servings(servings)?;
    let entry_date = parse_date(date)?;

    let row = db.insert_log_row(&NewLogRow {
        entry_date,
        food_name: food.to_string(),
        meal_type,
        serving_quantity,
        notes: notes.to_string(),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
        return Ok(());
    }

    let id = row.entry_id;
    let name = &row.food_name;
    let servings = servings_label(row.serving_quantity);
    let date = row.entry_date;
    match db.get_calorie_record(name)? {
        Some(record) => {
            let cal = f64::from(record.calories_per_serving) * row.serving_quantity;
            println!("Logged [{id}] {name}, {servings} for {meal_type} on {date} ({cal:.0} kcal)");
        }
        None => {
            println!("Logged [{id}] {name}, {servings} for {meal_type} on {date}");
            eprintln!(
                "Note: '{name}' is not in the calorie table and counts as 0 kcal in reports. \
                 Add it with `foodlog food add`."
            );
        }
    }

    Ok(())
}
