//! # dirdb
//!
//! A minimal record store laid out directly on the filesystem:
//! - a **database** is a directory
//! - a **table** is a file holding one JSON array
//! - a **record** is a JSON object, looked up by its `id` field
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 CLI / Interactive Menu                       │
//! │          (raw strings → names, records, row ids)             │
//! └──────────┬──────────────────┬──────────────────┬────────────┘
//!            │                  │                  │
//!            ▼                  ▼                  ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//!   │   Catalog    │   │  TableStore  │◄──│ TableFormatter │
//!   │ (databases)  │   │ (read-modify │   │ (text export)  │
//!   │              │   │   -write)    │   │                │
//!   └──────┬───────┘   └──────┬───────┘   └───────┬────────┘
//!          │                  │                   │
//!          ▼                  ▼                   ▼
//!     {db}/             {db}/{table}     {db}/{table}_formatted.txt
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod name;
pub mod record;
pub mod store;
pub mod format;
pub mod catalog;
pub mod menu;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, Result};
pub use config::{Config, WriteMode};
pub use record::Record;
pub use store::{CreateOutcome, RenameOutcome, TableStore};
pub use format::{ColumnPolicy, FormattedTable, TableFormatter};
pub use catalog::Catalog;
pub use menu::Menu;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dirdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
