use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result, bail};

use crate::db::Database;
use crate::models::{CalorieRecord, normalize_food_name, validate_category};

/// Summary of what a calorie CSV import would do / did.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CalorieImportSummary {
    pub rows_parsed: usize,
    pub records_created: usize,
    pub records_skipped: usize,
    pub dry_run: bool,
}

/// Parse a calorie reference CSV from any reader.
///
/// Expected header (case-insensitive, any order, extra columns ignored):
/// `food_name,calories_per_serving,category`
pub fn parse_calorie_csv<R: Read>(reader: R) -> Result<Vec<CalorieRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let idx_name = col("food_name").context("Missing required column: food_name")?;
    let idx_cal =
        col("calories_per_serving").context("Missing required column: calories_per_serving")?;
    let idx_cat = col("category").context("Missing required column: category")?;

    let mut records = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", i + 2))?;
        let line = record.position().map_or(i as u64 + 2, csv::Position::line);

        let food_name = record.get(idx_name).unwrap_or("");
        let calories = record.get(idx_cal).unwrap_or("");
        let category = record.get(idx_cat).unwrap_or("");

        if food_name.is_empty() && calories.is_empty() && category.is_empty() {
            continue;
        }

        let food_name = normalize_food_name(food_name).with_context(|| format!("Line {line}"))?;
        let Ok(calories_per_serving) = calories.parse::<u32>() else {
            bail!("Line {line}: invalid calories_per_serving '{calories}' for '{food_name}'");
        };
        let category = validate_category(category).with_context(|| format!("Line {line}"))?;

        records.push(CalorieRecord {
            food_name,
            calories_per_serving,
            category,
        });
    }

    Ok(records)
}

/// Insert parsed records into the calorie table.
///
/// Names already in the table, or repeated earlier in `records`, are skipped.
/// When `dry_run` is true, no data is written.
pub fn import_calorie_records(
    db: &Database,
    records: &[CalorieRecord],
    dry_run: bool,
) -> Result<CalorieImportSummary> {
    let mut records_created: usize = 0;
    let mut records_skipped: usize = 0;
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        let name = record.food_name.as_str();
        if !seen.insert(name) || db.get_calorie_record(name)?.is_some() {
            tracing::warn!(food = %name, "skipping calorie record already present");
            records_skipped += 1;
            continue;
        }
        if !dry_run {
            db.insert_calorie_record(record)?;
        }
        records_created += 1;
    }

    tracing::debug!(
        parsed = records.len(),
        created = records_created,
        skipped = records_skipped,
        dry_run,
        "calorie import finished"
    );

    Ok(CalorieImportSummary {
        rows_parsed: records.len(),
        records_created,
        records_skipped,
        dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodCategory;

    const SAMPLE_CSV: &str = "\
food_name,calories_per_serving,category
Apple,95,fruit
Brown Rice,216,Grain
Cheddar,113,dairy

Lentils,230,protein
";

    #[test]
    fn test_parse_calorie_csv_basic() {
        let records = parse_calorie_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].food_name, "apple");
        assert_eq!(records[1].food_name, "brown rice");
        assert_eq!(records[1].category, FoodCategory::Grain);
        assert_eq!(records[3].calories_per_serving, 230);
    }

    #[test]
    fn test_parse_columns_any_order_extra_ignored() {
        let csv = "\
Category,Notes,FOOD_NAME,Calories_Per_Serving
vegetable,steamed,Broccoli,55
";
        let records = parse_calorie_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![CalorieRecord {
                food_name: "broccoli".to_string(),
                calories_per_serving: 55,
                category: FoodCategory::Vegetable,
            }]
        );
    }

    #[test]
    fn test_parse_missing_required_column() {
        let csv = "food_name,category\napple,fruit\n";
        let err = parse_calorie_csv(csv.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("calories_per_serving"));
    }

    #[test]
    fn test_parse_unknown_category_reports_line() {
        let csv = "\
food_name,calories_per_serving,category
apple,95,fruit
gummy bears,140,candy
";
        let err = format!("{:#}", parse_calorie_csv(csv.as_bytes()).unwrap_err());
        assert!(err.contains("Line 3"));
        assert!(err.contains("candy"));
    }

    #[test]
    fn test_parse_bad_calories() {
        let csv = "food_name,calories_per_serving,category\napple,-5,fruit\n";
        let err = parse_calorie_csv(csv.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("Line 2"));
        assert!(err.contains("-5"));
    }

    #[test]
    fn test_import_dry_run() {
        let db = Database::open_in_memory().unwrap();
        let records = parse_calorie_csv(SAMPLE_CSV.as_bytes()).unwrap();

        let summary = import_calorie_records(&db, &records, true).unwrap();
        assert_eq!(summary.rows_parsed, 4);
        assert_eq!(summary.records_created, 4);
        assert_eq!(summary.records_skipped, 0);
        assert!(summary.dry_run);

        assert!(db.all_calorie_records().unwrap().is_empty());
    }

    #[test]
    fn test_import_actual_skips_existing() {
        let db = Database::open_in_memory().unwrap();
        db.insert_calorie_record(&CalorieRecord {
            food_name: "apple".to_string(),
            calories_per_serving: 80,
            category: FoodCategory::Fruit,
        })
        .unwrap();

        let records = parse_calorie_csv(SAMPLE_CSV.as_bytes()).unwrap();
        let summary = import_calorie_records(&db, &records, false).unwrap();
        assert_eq!(summary.records_created, 3);
        assert_eq!(summary.records_skipped, 1);

        let all = db.all_calorie_records().unwrap();
        assert_eq!(all.len(), 4);
        // Existing record is left untouched
        let apple = db.get_calorie_record("apple").unwrap().unwrap();
        assert_eq!(apple.calories_per_serving, 80);
    }

    #[test]
    fn test_import_repeated_name_in_file() {
        let db = Database::open_in_memory().unwrap();
        let csv = "\
food_name,calories_per_serving,category
oats,150,grain
Oats,160,grain
";
        let records = parse_calorie_csv(csv.as_bytes()).unwrap();
        let summary = import_calorie_records(&db, &records, false).unwrap();
        assert_eq!(summary.records_created, 1);
        assert_eq!(summary.records_skipped, 1);
        assert_eq!(
            db.get_calorie_record("oats")
                .unwrap()
                .unwrap()
                .calories_per_serving,
            150
        );
    }
}
