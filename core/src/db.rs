use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Days, NaiveDate};
use rusqlite::types::{
    FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, Value, ValueRef,
};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;

use crate::error::ReportError;
use crate::models::{
    CalorieRecord, FoodCategory, LogRow, MealType, NewLogRow, UpdateLogRow, normalize_food_name,
    validate_serving_quantity,
};
use crate::render::TabularRenderer;
use crate::report::{CalorieLookup, Report, ReportAggregator};

const DATE_FORMAT: &str = "%Y-%m-%d";

const LOG_COLUMNS: &str =
    "entry_id, entry_date, food_name, meal_type, serving_quantity, entry_notes";

const CALORIE_COLUMNS: &str = "food_name, calories_per_serving, food_category";

/// `today` minus `days`, clamped to [`NaiveDate::MIN`] when that would
/// underflow.
#[must_use]
pub fn days_before(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Result of [`Database::delete_entries_older_than`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneSummary {
    /// Entries dated before this day were removed.
    pub cutoff: NaiveDate,
    pub removed: usize,
}

/// Which food log rows to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogQuery {
    All,
    Id(i64),
    Date(NaiveDate),
    /// Inclusive on both ends.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Case-insensitive substring match on the food name.
    FoodName(String),
}

impl LogQuery {
    #[must_use]
    pub fn yesterday(today: NaiveDate) -> Self {
        Self::Date(days_before(today, 1))
    }

    /// The `days` most recent days, today included.
    #[must_use]
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        Self::DateRange {
            start: days_before(today, days.saturating_sub(1)),
            end: today,
        }
    }

    fn to_sql(&self) -> (String, Vec<Value>) {
        let (filter, values) = match self {
            Self::All => ("", Vec::new()),
            Self::Id(id) => ("WHERE entry_id = ?1", vec![Value::Integer(*id)]),
            Self::Date(date) => ("WHERE entry_date = ?1", vec![date_value(*date)]),
            Self::DateRange { start, end } => (
                "WHERE entry_date >= ?1 AND entry_date <= ?2",
                vec![date_value(*start), date_value(*end)],
            ),
            Self::FoodName(text) => {
                let escaped = text
                    .trim()
                    .to_lowercase()
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                (
                    "WHERE food_name LIKE ?1 ESCAPE '\\'",
                    vec![Value::Text(format!("%{escaped}%"))],
                )
            }
        };
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM food_log {filter} ORDER BY entry_date, entry_id"
        );
        (sql, values)
    }
}

impl fmt::Display for LogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all entries"),
            Self::Id(id) => write!(f, "entry {id}"),
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::DateRange { start, end } => write!(
                f,
                "{} to {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ),
            Self::FoodName(text) => write!(f, "foods matching '{text}'"),
        }
    }
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format(DATE_FORMAT).to_string())
}

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for FoodCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FoodCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        tracing::info!(path = %path.display(), "database opened");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            tracing::info!(from = version, to = 1, "running migration");
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS food_log (
                        entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
                        entry_date TEXT NOT NULL,
                        food_name TEXT NOT NULL,
                        meal_type TEXT NOT NULL
                            CHECK (meal_type IN
                                ('breakfast', 'brunch', 'lunch', 'dinner', 'snack')),
                        serving_quantity REAL NOT NULL CHECK (serving_quantity > 0),
                        entry_notes TEXT NOT NULL DEFAULT ''
                    );

                    CREATE TABLE IF NOT EXISTS calorie_table (
                        food_name TEXT PRIMARY KEY,
                        calories_per_serving INTEGER NOT NULL
                            CHECK (calories_per_serving >= 0),
                        food_category TEXT NOT NULL
                            CHECK (food_category IN
                                ('grain', 'fruit', 'vegetable', 'dairy', 'protein', 'other'))
                    );

                    CREATE INDEX IF NOT EXISTS idx_food_log_date ON food_log(entry_date);
                    CREATE INDEX IF NOT EXISTS idx_food_log_food_name ON food_log(food_name);

                    PRAGMA user_version = 1;",
                )
                .context("Failed to create food log schema")?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    // Expects LOG_COLUMNS order:
    // 0: entry_id, 1: entry_date, 2: food_name, 3: meal_type,
    // 4: serving_quantity, 5: entry_notes
    fn log_row_from_row(row: &rusqlite::Row) -> rusqlite::Result<LogRow> {
        let date_str: String = row.get(1)?;
        let entry_date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        Ok(LogRow {
            entry_id: row.get(0)?,
            entry_date,
            food_name: row.get(2)?,
            meal_type: row.get(3)?,
            serving_quantity: row.get(4)?,
            notes: row.get(5)?,
        })
    }

    fn calorie_record_from_row(row: &rusqlite::Row) -> rusqlite::Result<CalorieRecord> {
        Ok(CalorieRecord {
            food_name: row.get(0)?,
            calories_per_serving: row.get(1)?,
            category: row.get(2)?,
        })
    }

    // --- Food log ---

    pub fn insert_log_row(&self, entry: &NewLogRow) -> Result<LogRow> {
        let food_name = normalize_food_name(&entry.food_name)?;
        let serving_quantity = validate_serving_quantity(entry.serving_quantity)?;
        let date_str = entry.entry_date.format(DATE_FORMAT).to_string();
        self.conn.execute(
            "INSERT INTO food_log (entry_date, food_name, meal_type, serving_quantity, entry_notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                date_str,
                food_name,
                entry.meal_type,
                serving_quantity,
                entry.notes.trim(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(
            entry_id = id,
            food = %food_name,
            meal = %entry.meal_type,
            "log entry added"
        );
        self.get_log_row(id)
    }

    pub fn find_log_row(&self, id: i64) -> Result<Option<LogRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {LOG_COLUMNS} FROM food_log WHERE entry_id = ?1"),
                params![id],
                Self::log_row_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn get_log_row(&self, id: i64) -> Result<LogRow> {
        self.find_log_row(id)?
            .with_context(|| format!("Entry {id} not found"))
    }

    pub fn fetch_log_rows(&self, query: &LogQuery) -> Result<Vec<LogRow>> {
        let (sql, values) = query.to_sql();
        tracing::debug!(%query, "fetching log rows");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::log_row_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read log rows for {query}"))?;
        Ok(rows)
    }

    /// Apply the fields present in `update`. Returns `None` if no entry has `id`.
    pub fn update_log_row(&self, id: i64, update: &UpdateLogRow) -> Result<Option<LogRow>> {
        if update.is_empty() {
            bail!("Nothing to update for entry {id}");
        }
        let food_name = update
            .food_name
            .as_deref()
            .map(normalize_food_name)
            .transpose()?;
        let serving_quantity = update
            .serving_quantity
            .map(validate_serving_quantity)
            .transpose()?;
        let date_str = update
            .entry_date
            .map(|d| d.format(DATE_FORMAT).to_string());
        let notes = update.notes.as_deref().map(str::trim);

        let changed = self.conn.execute(
            "UPDATE food_log SET
                entry_date = COALESCE(?1, entry_date),
                food_name = COALESCE(?2, food_name),
                meal_type = COALESCE(?3, meal_type),
                serving_quantity = COALESCE(?4, serving_quantity),
                entry_notes = COALESCE(?5, entry_notes)
             WHERE entry_id = ?6",
            params![
                date_str,
                food_name,
                update.meal_type,
                serving_quantity,
                notes,
                id
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        tracing::info!(entry_id = id, "log entry updated");
        self.find_log_row(id)
    }

    pub fn delete_log_row(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_log WHERE entry_id = ?1", params![id])?;
        if rows > 0 {
            tracing::info!(entry_id = id, "log entry deleted");
        }
        Ok(rows > 0)
    }

    /// Delete entries dated strictly before `today - days`.
    pub fn delete_entries_older_than(&self, days: u32, today: NaiveDate) -> Result<PruneSummary> {
        let cutoff = days_before(today, days);
        let removed = if cutoff == NaiveDate::MIN {
            0
        } else {
            self.conn.execute(
                "DELETE FROM food_log WHERE entry_date < ?1",
                params![cutoff.format(DATE_FORMAT).to_string()],
            )?
        };
        tracing::info!(%cutoff, removed, "pruned old log entries");
        Ok(PruneSummary { cutoff, removed })
    }

    // --- Calorie table ---

    /// Insert a calorie record. Fails if the food name is already present.
    pub fn insert_calorie_record(&self, record: &CalorieRecord) -> Result<CalorieRecord> {
        let food_name = normalize_food_name(&record.food_name)?;
        let result = self.conn.execute(
            &format!("INSERT INTO calorie_table ({CALORIE_COLUMNS}) VALUES (?1, ?2, ?3)"),
            params![food_name, record.calories_per_serving, record.category],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                bail!("'{food_name}' is already in the calorie table");
            }
            Err(e) => return Err(e).context("Failed to insert calorie record"),
        }
        tracing::info!(
            food = %food_name,
            calories = record.calories_per_serving,
            "calorie record added"
        );
        Ok(CalorieRecord {
            food_name,
            calories_per_serving: record.calories_per_serving,
            category: record.category,
        })
    }

    pub fn get_calorie_record(&self, food_name: &str) -> Result<Option<CalorieRecord>> {
        let name = food_name.trim().to_lowercase();
        let record = self
            .conn
            .query_row(
                &format!("SELECT {CALORIE_COLUMNS} FROM calorie_table WHERE food_name = ?1"),
                params![name],
                Self::calorie_record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn delete_calorie_record(&self, food_name: &str) -> Result<bool> {
        let name = food_name.trim().to_lowercase();
        let rows = self.conn.execute(
            "DELETE FROM calorie_table WHERE food_name = ?1",
            params![name],
        )?;
        if rows > 0 {
            tracing::info!(food = %name, "calorie record deleted");
        }
        Ok(rows > 0)
    }

    pub fn all_calorie_records(&self) -> Result<Vec<CalorieRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CALORIE_COLUMNS} FROM calorie_table ORDER BY food_name"
        ))?;
        let records = stmt
            .query_map([], Self::calorie_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // --- Reports ---

    /// Snapshot the calorie table into a lookup, streaming rows straight
    /// from the cursor.
    pub fn calorie_lookup(&self) -> Result<CalorieLookup, ReportError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CALORIE_COLUMNS} FROM calorie_table"))
            .map_err(ReportError::lookup_build)?;
        let rows = stmt
            .query_map([], Self::calorie_record_from_row)
            .map_err(ReportError::lookup_build)?;
        CalorieLookup::try_from_rows(rows)
    }

    pub fn build_report(&self, query: &LogQuery) -> Result<Report, ReportError> {
        let lookup = self.calorie_lookup()?;

        let (sql, values) = query.to_sql();
        tracing::debug!(%query, "building report");
        let mut stmt = self.conn.prepare(&sql).map_err(ReportError::aggregation)?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::log_row_from_row)
            .map_err(ReportError::aggregation)?;
        let report = ReportAggregator::try_aggregate(rows, &lookup)?;
        Ok(report)
    }

    pub fn render_log_rows(
        &self,
        query: &LogQuery,
        renderer: &TabularRenderer,
    ) -> Result<String, ReportError> {
        let (sql, values) = query.to_sql();
        let mut stmt = self.conn.prepare(&sql).map_err(ReportError::render)?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::log_row_from_row)
            .map_err(ReportError::render)?;
        let table = renderer.try_render(rows)?;
        Ok(table)
    }
}
