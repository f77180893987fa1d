//! Table Formatter
//!
//! Renders records as a pipe-delimited text table and saves it next to the
//! source table as `<table>_formatted.txt`.
//!
//! ```text
//! | id | name |
//! | --- | --- |
//! | 1 | A |
//! ```

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::Config;
use crate::error::{DbError, Result};
use crate::record::Record;
use crate::store::TableStore;

/// Rendered in place of a field the row does not have
pub const MISSING_CELL: &str = "undefined";

const CELL_SEPARATOR: &str = " | ";
const HEADER_RULE: &str = "---";

/// How the column set is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnPolicy {
    /// Columns are the first record's keys, in that record's order.
    /// Fields that only appear in later records are not shown.
    #[default]
    FirstRecord,
}

impl ColumnPolicy {
    /// Column names for `records`, or `None` if there is no record to derive
    /// them from
    pub fn columns(&self, records: &[Record]) -> Option<Vec<String>> {
        match self {
            ColumnPolicy::FirstRecord => records.first().map(|r| r.keys().cloned().collect()),
        }
    }
}

/// A rendered table and where it was saved
#[derive(Debug, Clone)]
pub struct FormattedTable {
    pub text: String,
    pub path: PathBuf,
}

/// Fixed-column text renderer
#[derive(Debug, Clone)]
pub struct TableFormatter {
    policy: ColumnPolicy,
    formatted_suffix: String,
}

impl TableFormatter {
    pub fn new(config: &Config) -> Self {
        Self {
            policy: ColumnPolicy::default(),
            formatted_suffix: config.formatted_suffix.clone(),
        }
    }

    /// Render `records`. An empty slice is an error since there is no first
    /// record to take the columns from.
    pub fn render(&self, table: &str, records: &[Record]) -> Result<String> {
        let columns = self
            .policy
            .columns(records)
            .ok_or_else(|| DbError::EmptyTable(table.to_string()))?;

        let mut out = String::new();
        push_row(&mut out, columns.iter().map(String::as_str));
        push_row(&mut out, columns.iter().map(|_| HEADER_RULE));

        for record in records {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| record.get(c).map_or_else(|| MISSING_CELL.to_string(), cell_text))
                .collect();
            push_row(&mut out, cells.iter().map(String::as_str));
        }

        Ok(out)
    }

    /// Read `table`, render it and write the result beside the table file
    pub fn export(&self, store: &TableStore, db: &str, table: &str) -> Result<FormattedTable> {
        let records = store.read_table(db, table)?;
        let text = self.render(table, &records)?;

        let table_path = store.table_path(db, table)?;
        let path = table_path.with_file_name(format!("{}{}", table, self.formatted_suffix));
        fs::write(&path, &text)?;

        tracing::info!(db, table, path = %path.display(), "formatted table saved");
        Ok(FormattedTable { text, path })
    }
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    out.push_str("| ");
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push_str(CELL_SEPARATOR);
        }
        out.push_str(cell);
    }
    out.push_str(" |\n");
}

/// Strings print bare; everything else prints as compact JSON
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
