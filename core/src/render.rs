//! Fixed-width text table for food log rows.
//!
//! Columns are padded with spaces rather than tabs so alignment does not
//! depend on the terminal's tab width.

use serde::Deserialize;

use crate::error::{BoxError, ReportError};
use crate::models::LogRow;

pub const NO_RESULTS: &str = "No results found.";

const HEADERS: [&str; 6] = [
    "Entry ID",
    "Entry Date",
    "Food Name",
    "Meal Type",
    "Serving Qty",
    "Entry Notes",
];

/// Column widths in characters. The notes column takes the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnWidths {
    pub entry_id: usize,
    pub entry_date: usize,
    pub food_name: usize,
    pub meal_type: usize,
    pub serving_quantity: usize,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            entry_id: 16,
            entry_date: 16,
            food_name: 32,
            meal_type: 16,
            serving_quantity: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TabularRenderer {
    widths: ColumnWidths,
}

impl TabularRenderer {
    #[must_use]
    pub fn new(widths: ColumnWidths) -> Self {
        Self { widths }
    }

    #[must_use]
    pub fn render(&self, rows: &[LogRow]) -> String {
        let mut out = String::new();
        if rows.is_empty() {
            out.push_str(NO_RESULTS);
            out.push('\n');
            return out;
        }
        self.write_line(&mut out, HEADERS);
        for row in rows {
            self.write_row(&mut out, row);
        }
        out
    }

    /// Render from a fallible row source. A read error yields
    /// [`ReportError::Render`], never the empty-table message.
    pub fn try_render<I, E>(&self, rows: I) -> Result<String, ReportError>
    where
        I: IntoIterator<Item = Result<LogRow, E>>,
        E: Into<BoxError>,
    {
        let mut rows = rows.into_iter().peekable();
        let mut out = String::new();

        if rows.peek().is_none() {
            out.push_str(NO_RESULTS);
            out.push('\n');
            return Ok(out);
        }

        self.write_line(&mut out, HEADERS);
        for row in rows {
            self.write_row(&mut out, &row.map_err(ReportError::render)?);
        }
        Ok(out)
    }

    fn write_row(&self, out: &mut String, row: &LogRow) {
        let id = row.entry_id.to_string();
        let date = row.entry_date.format("%Y-%m-%d").to_string();
        let qty = format_quantity(row.serving_quantity);
        self.write_line(
            out,
            [
                id.as_str(),
                date.as_str(),
                row.food_name.as_str(),
                row.meal_type.as_str(),
                qty.as_str(),
                row.notes.as_str(),
            ],
        );
    }

    fn write_line(&self, out: &mut String, fields: [&str; 6]) {
        let w = &self.widths;
        let widths = [
            w.entry_id,
            w.entry_date,
            w.food_name,
            w.meal_type,
            w.serving_quantity,
        ];
        for (field, width) in fields.iter().zip(widths) {
            out.push_str(field);
            // Overlong values still get one separating space.
            let pad = width.saturating_sub(field.chars().count()).max(1);
            out.extend(std::iter::repeat_n(' ', pad));
        }
        out.push_str(fields[5]);
        out.push('\n');
    }
}

/// Serving quantities always show a decimal point: `2.0`, `1.5`.
#[must_use]
pub fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{qty:.1}")
    } else {
        format!("{qty}")
    }
}
