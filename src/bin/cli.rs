//! dirdb CLI
//!
//! Command-line interface for managing databases, tables and records.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dirdb::config::ConfigBuilder;
use dirdb::record::{parse_record, parse_row_id};
use dirdb::{
    Catalog, Config, CreateOutcome, DbError, Menu, RenameOutcome, TableFormatter, TableStore,
    WriteMode,
};
use tracing_subscriber::{fmt, EnvFilter};

/// dirdb CLI
#[derive(Parser, Debug)]
#[command(name = "dirdb")]
#[command(about = "Directory-backed record store: databases are folders, tables are JSON files")]
#[command(version)]
struct Args {
    /// Root directory holding the databases
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// JSON config file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rewrite table files in place instead of write-then-rename
    #[arg(long)]
    in_place: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Table operations
    Table {
        #[command(subcommand)]
        action: TableAction,
    },

    /// Record operations
    Row {
        #[command(subcommand)]
        action: RowAction,
    },

    /// Start the interactive menu
    Menu,
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Create a database
    Create { name: String },

    /// Delete a database and all of its tables
    Drop { name: String },

    /// Rename a database
    Rename { old: String, new: String },

    /// List databases under the data directory
    List,

    /// List the contents of a database
    Ls { name: String },
}

#[derive(Subcommand, Debug)]
enum TableAction {
    /// Create an empty table
    Create { db: String, table: String },

    /// Print all records as JSON
    Read { db: String, table: String },

    /// Delete a table
    Drop { db: String, table: String },

    /// Rename a table
    Rename { db: String, old: String, new: String },

    /// Print the table as text and save it to <table>_formatted.txt
    Format { db: String, table: String },
}

#[derive(Subcommand, Debug)]
enum RowAction {
    /// Append a record (JSON object)
    Insert {
        db: String,
        table: String,
        record: String,
    },

    /// Replace the record with the given id
    Update {
        db: String,
        table: String,
        id: String,
        record: String,
    },

    /// Delete the record with the given id
    Delete { db: String, table: String, id: String },
}

fn main() {
    // Logs go to stderr so table output on stdout stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,dirdb=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    tracing::debug!("dirdb v{}", dirdb::VERSION);
    tracing::debug!("Data directory: {}", config.data_dir.display());

    if let Err(e) = run(args.command, &config) {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> dirdb::Result<Config> {
    let base = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let mut builder = ConfigBuilder::from_config(base);
    if let Some(dir) = &args.data_dir {
        builder = builder.data_dir(dir);
    }
    if args.in_place {
        builder = builder.write_mode(WriteMode::InPlace);
    }

    Ok(builder.build())
}

fn run(command: Commands, config: &Config) -> dirdb::Result<()> {
    let catalog = Catalog::new(config);
    let store = TableStore::new(config.clone());
    let formatter = TableFormatter::new(config);

    match command {
        Commands::Db { action } => match action {
            DbAction::Create { name } => {
                catalog.create_database(&name)?;
                println!("Database \"{}\" created successfully.", name);
            }
            DbAction::Drop { name } => {
                catalog.drop_database(&name)?;
                println!("Database \"{}\" deleted successfully.", name);
            }
            DbAction::Rename { old, new } => {
                catalog.rename_database(&old, &new)?;
                println!("Database \"{}\" renamed to \"{}\" successfully.", old, new);
            }
            DbAction::List => {
                for name in catalog.list_databases()? {
                    println!("{}", name);
                }
            }
            DbAction::Ls { name } => {
                println!("Contents of Database \"{}\":", name);
                for entry in catalog.list_tables(&name)? {
                    println!("{}", entry);
                }
            }
        },

        Commands::Table { action } => match action {
            TableAction::Create { db, table } => match store.create_table(&db, &table)? {
                CreateOutcome::Created => {
                    println!("Table \"{}\" created successfully in database \"{}\".", table, db)
                }
                CreateOutcome::AlreadyExists => {
                    println!("Table \"{}\" already exists in database \"{}\".", table, db)
                }
            },
            TableAction::Read { db, table } => {
                let records = store.read_table(&db, &table)?;
                let json = serde_json::to_string_pretty(&records)
                    .map_err(|e| DbError::Serialization(e.to_string()))?;
                println!("{}", json);
            }
            TableAction::Drop { db, table } => {
                store.delete_table(&db, &table)?;
                println!("Table \"{}\" deleted successfully from database \"{}\".", table, db);
            }
            TableAction::Rename { db, old, new } => match store.rename_table(&db, &old, &new)? {
                RenameOutcome::Renamed => println!(
                    "Table \"{}\" renamed to \"{}\" in database \"{}\" successfully.",
                    old, new, db
                ),
                RenameOutcome::SourceMissing => {
                    println!("Table \"{}\" does not exist in database \"{}\".", old, db)
                }
            },
            TableAction::Format { db, table } => {
                let formatted = formatter.export(&store, &db, &table)?;
                print!("{}", formatted.text);
                println!("Formatted table saved to {}.", formatted.path.display());
            }
        },

        Commands::Row { action } => match action {
            RowAction::Insert { db, table, record } => {
                store.create_row(&db, &table, parse_record(&record)?)?;
                println!("Data written to \"{}\" in Database \"{}\" successfully.", table, db);
            }
            RowAction::Update {
                db,
                table,
                id,
                record,
            } => {
                let id = parse_row_id(&id);
                store.update_row(&db, &table, &id, parse_record(&record)?)?;
                println!(
                    "Record with ID {} updated successfully in table \"{}\" in database \"{}\".",
                    id, table, db
                );
            }
            RowAction::Delete { db, table, id } => {
                let id = parse_row_id(&id);
                store.delete_row(&db, &table, &id)?;
                println!(
                    "Record with ID {} deleted successfully from table \"{}\" in database \"{}\".",
                    id, table, db
                );
            }
        },

        Commands::Menu => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut menu = Menu::new(&catalog, &store, &formatter, stdin.lock(), stdout.lock());
            menu.run()?;
        }
    }

    Ok(())
}
