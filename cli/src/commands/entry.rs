use anyhow::{Result, bail};

use foodlog_core::db::Database;
use foodlog_core::models::{UpdateLogRow, validate_meal_type};
use foodlog_core::render::TabularRenderer;

use super::helpers::{exit_not_found, parse_date, parse_servings, servings_label, today};

pub(crate) fn cmd_show(
    db: &Database,
    renderer: &TabularRenderer,
    entry_id: i64,
    json: bool,
) -> Result<()> {
    let Some(row) = db.find_log_row(entry_id)? else {
        exit_not_found(&format!("Entry {entry_id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        print!("{}", renderer.render(std::slice::from_ref(&row)));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_update(
    db: &Database,
    entry_id: i64,
    food: Option<&str>,
    servings: Option<&str>,
    meal: Option<&str>,
    date: Option<String>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let update = UpdateLogRow {
        entry_date: date.map(Some).map(parse_date).transpose()?,
        food_name: food.map(str::to_string),
        meal_type: meal.map(validate_meal_type).transpose()?,
        serving_quantity: servings.map(parse_servings).transpose()?,
        notes,
    };
    if update.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --food, --servings, --meal, --date, \
             or --notes"
        );
    }

    let Some(row) = db.update_log_row(entry_id, &update)? else {
        exit_not_found(&format!("Entry {entry_id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        let name = &row.food_name;
        let servings = servings_label(row.serving_quantity);
        let meal = row.meal_type;
        let date = row.entry_date;
        println!("Updated entry {entry_id}: {name}, {servings} for {meal} on {date}");
    }
    Ok(())
}

pub(crate) fn cmd_delete(db: &Database, entry_id: i64, json: bool) -> Result<()> {
    if !db.delete_log_row(entry_id)? {
        exit_not_found(&format!("Entry {entry_id} not found"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": entry_id }));
    } else {
        println!("Deleted entry {entry_id}");
    }
    Ok(())
}

pub(crate) fn cmd_prune(db: &Database, days: u32, json: bool) -> Result<()> {
    let pruned = db.delete_entries_older_than(days, today())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pruned)?);
    } else {
        let removed = pruned.removed;
        let cutoff = pruned.cutoff;
        println!("Deleted {removed} entries dated before {cutoff}");
    }
    Ok(())
}
