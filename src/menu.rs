//! Interactive Menu
//!
//! Line-oriented front end over the catalog, table store and formatter.
//! Works on any `BufRead`/`Write` pair so it can be driven from stdin or
//! from a test buffer.
//!
//! ## Layout
//! ```text
//! DATABASE MANAGER
//!  1. Database  → create / contents / rename / delete
//!  2. Table     → create / read / rename / delete / format
//!  3. Records   → create / update / read / delete
//!  4. Quit
//! ```
//!
//! All inputs arrive as raw strings; record JSON and row ids are decoded
//! before they reach the store. Failed operations are printed and the menu
//! keeps running.

use std::io::{self, BufRead, Write};

use crate::catalog::Catalog;
use crate::error::{DbError, Result};
use crate::format::TableFormatter;
use crate::record::{parse_record, parse_row_id};
use crate::store::{CreateOutcome, RenameOutcome, TableStore};

/// Whether the menu loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Interactive menu bound to one reader and one writer
pub struct Menu<'a, R, W> {
    catalog: &'a Catalog,
    store: &'a TableStore,
    formatter: &'a TableFormatter,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        catalog: &'a Catalog,
        store: &'a TableStore,
        formatter: &'a TableFormatter,
        input: R,
        output: W,
    ) -> Self {
        Self {
            catalog,
            store,
            formatter,
            input,
            output,
        }
    }

    /// Run until the user quits or input ends
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, " ******  DATABASE MANAGER ****** ")?;
            writeln!(self.output, "\n 1.Database \n 2.Table \n 3.Records \n 4.Quit \n")?;

            let flow = match self.prompt("Enter a Choice:- ")?.as_deref() {
                None => Flow::Quit,
                Some("1") => self.database_menu()?,
                Some("2") => self.table_menu()?,
                Some("3") => self.records_menu()?,
                Some("4") | Some("q") => Flow::Quit,
                Some(_) => {
                    writeln!(self.output, "xX enter correct choice Xx")?;
                    Flow::Continue
                }
            };

            if flow == Flow::Quit {
                writeln!(self.output, "Close")?;
                return Ok(());
            }
        }
    }

    // =========================================================================
    // Sub-menus
    // =========================================================================

    fn database_menu(&mut self) -> io::Result<Flow> {
        writeln!(self.output, " *** DataBase Operation *** ")?;
        writeln!(
            self.output,
            "\n1.Create the Database\n2.Show Database Contents\n3.Rename Database\n4.Delete Database\n5.Back"
        )?;

        let Some(choice) = self.prompt("Enter Choice:- ")? else {
            return Ok(Flow::Quit);
        };

        match choice.as_str() {
            "1" => {
                let Some(db) = self.prompt("Enter Database Name:- ")? else {
                    return Ok(Flow::Quit);
                };
                let result = self.catalog.create_database(&db);
                self.report(result, |_| format!("Database \"{}\" created successfully.", db))?;
            }
            "2" => {
                let Some(db) = self.prompt("Enter Database Name:- ")? else {
                    return Ok(Flow::Quit);
                };
                let result = self.catalog.list_tables(&db);
                self.report(result, |entries| {
                    let mut text = format!("Contents of Database \"{}\":", db);
                    for entry in entries {
                        text.push('\n');
                        text.push_str(&entry);
                    }
                    text
                })?;
            }
            "3" => {
                let Some(old) = self.prompt("Enter Database Name:- ")? else {
                    return Ok(Flow::Quit);
                };
                let Some(new) = self.prompt("Enter New Database Name:- ")? else {
                    return Ok(Flow::Quit);
                };
                let result = self.catalog.rename_database(&old, &new);
                self.report(result, |_| {
                    format!("Database \"{}\" renamed to \"{}\" successfully.", old, new)
                })?;
            }
            "4" => {
                let Some(db) = self.prompt("Enter Database Name:- ")? else {
                    return Ok(Flow::Quit);
                };
                let result = self.catalog.drop_database(&db);
                self.report(result, |_| format!("Database \"{}\" deleted successfully.", db))?;
            }
            "5" => {}
            _ => writeln!(self.output, "xX enter correct choice Xx")?,
        }

        Ok(Flow::Continue)
    }

    fn table_menu(&mut self) -> io::Result<Flow> {
        writeln!(self.output, " *** Table Operation *** ")?;
        writeln!(
            self.output,
            "\n1.Create Table\n2.Read Table\n3.Rename Table\n4.Delete Table\n5.Format Table\n6.Back"
        )?;

        let Some(choice) = self.prompt("Enter Choice:- ")? else {
            return Ok(Flow::Quit);
        };
        if choice == "6" {
            return Ok(Flow::Continue);
        }
        if !matches!(choice.as_str(), "1" | "2" | "3" | "4" | "5") {
            writeln!(self.output, "xX enter correct choice Xx")?;
            return Ok(Flow::Continue);
        }

        let Some((db, table)) = self.prompt_table()? else {
            return Ok(Flow::Quit);
        };

        match choice.as_str() {
            "1" => {
                let result = self.store.create_table(&db, &table);
                self.report(result, |outcome| match outcome {
                    CreateOutcome::Created => format!(
                        "Table \"{}\" created successfully in database \"{}\".",
                        table, db
                    ),
                    CreateOutcome::AlreadyExists => format!(
                        "Table \"{}\" already exists in database \"{}\".",
                        table, db
                    ),
                })?;
            }
            "2" => self.print_table(&db, &table)?,
            "3" => {
                let Some(new) = self.prompt("Enter New Table Name:- ")? else {
                    return Ok(Flow::Quit);
                };
                let result = self.store.rename_table(&db, &table, &new);
                self.report(result, |outcome| match outcome {
                    RenameOutcome::Renamed => format!(
                        "Table \"{}\" renamed to \"{}\" in database \"{}\" successfully.",
                        table, new, db
                    ),
                    RenameOutcome::SourceMissing => format!(
                        "Table \"{}\" does not exist in database \"{}\".",
                        table, db
                    ),
                })?;
            }
            "4" => {
                let result = self.store.delete_table(&db, &table);
                self.report(result, |_| {
                    format!(
                        "Table \"{}\" deleted successfully from database \"{}\".",
                        table, db
                    )
                })?;
            }
            _ => {
                let result = self.formatter.export(self.store, &db, &table);
                self.report(result, |formatted| {
                    format!(
                        "Contents of \"{}\" in Database \"{}\":\n{}Formatted table saved to {}.",
                        table,
                        db,
                        formatted.text,
                        formatted.path.display()
                    )
                })?;
            }
        }

        Ok(Flow::Continue)
    }

    fn records_menu(&mut self) -> io::Result<Flow> {
        writeln!(self.output, " *** Records Operation *** ")?;
        writeln!(
            self.output,
            "\n1.Create Row\n2.Update Row\n3.Read Rows\n4.Delete Row\n5.Back"
        )?;

        let Some(choice) = self.prompt("Enter Choice:- ")? else {
            return Ok(Flow::Quit);
        };
        if choice == "5" {
            return Ok(Flow::Continue);
        }
        if !matches!(choice.as_str(), "1" | "2" | "3" | "4") {
            writeln!(self.output, "xX enter correct choice Xx")?;
            return Ok(Flow::Continue);
        }

        let Some((db, table)) = self.prompt_table()? else {
            return Ok(Flow::Quit);
        };

        match choice.as_str() {
            "1" => {
                let Some(raw) = self.prompt("Enter Data in Json Format:- ")? else {
                    return Ok(Flow::Quit);
                };
                let result = parse_record(&raw)
                    .and_then(|record| self.store.create_row(&db, &table, record));
                self.report(result, |_| {
                    format!(
                        "Data written to \"{}\" in Database \"{}\" successfully.",
                        table, db
                    )
                })?;
            }
            "2" => {
                let Some(raw_id) = self.prompt("Enter id:- ")? else {
                    return Ok(Flow::Quit);
                };
                let Some(raw) = self.prompt("Enter Data in Json Format:- ")? else {
                    return Ok(Flow::Quit);
                };
                let id = parse_row_id(&raw_id);
                let result = parse_record(&raw)
                    .and_then(|record| self.store.update_row(&db, &table, &id, record));
                self.report(result, |_| {
                    format!(
                        "Record with ID {} updated successfully in table \"{}\" in database \"{}\".",
                        id, table, db
                    )
                })?;
            }
            "3" => self.print_table(&db, &table)?,
            _ => {
                let Some(raw_id) = self.prompt("Enter id:- ")? else {
                    return Ok(Flow::Quit);
                };
                let id = parse_row_id(&raw_id);
                let result = self.store.delete_row(&db, &table, &id);
                self.report(result, |_| {
                    format!(
                        "Record with ID {} deleted successfully from table \"{}\" in database \"{}\".",
                        id, table, db
                    )
                })?;
            }
        }

        Ok(Flow::Continue)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn print_table(&mut self, db: &str, table: &str) -> io::Result<()> {
        let result = self.store.read_table(db, table).and_then(|records| {
            serde_json::to_string_pretty(&records)
                .map_err(|e| DbError::Serialization(e.to_string()))
        });
        self.report(result, |json| {
            format!("Contents of \"{}\" in Database \"{}\":\n{}", table, db, json)
        })
    }

    /// Ask for a database name then a table name
    fn prompt_table(&mut self) -> io::Result<Option<(String, String)>> {
        let Some(db) = self.prompt("Enter Database Name:- ")? else {
            return Ok(None);
        };
        let Some(table) = self.prompt("Enter Table Name:- ")? else {
            return Ok(None);
        };
        Ok(Some((db, table)))
    }

    /// Print `label` and read one line; `None` at end of input
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn report<T>(&mut self, result: Result<T>, on_success: impl FnOnce(T) -> String) -> io::Result<()> {
        match result {
            Ok(value) => writeln!(self.output, "{}", on_success(value)),
            Err(e) => {
                if e.is_recoverable() {
                    tracing::debug!(error = %e, "menu operation failed");
                } else {
                    tracing::error!(error = %e, "menu operation failed");
                }
                writeln!(self.output, "Error: {}", e)
            }
        }
    }
}
