//! Tests for TableStore
//!
//! These tests verify:
//! - Table lifecycle (create/read/delete/rename)
//! - Row append, update-by-id and delete-by-id
//! - Record order surviving every mutation
//! - Untouched files on unknown ids and corrupt content
//! - Both write modes

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use dirdb::config::{Config, WriteMode};
use dirdb::record::{parse_row_id, Record};
use dirdb::store::{CreateOutcome, RenameOutcome, TableStore};
use dirdb::DbError;
use serde_json::{json, Value};
use tempfile::TempDir;

const DB: &str = "school";
const TABLE: &str = "students.json";

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store_with_mode(mode: WriteMode) -> (TempDir, TableStore) {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join(DB)).unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .write_mode(mode)
        .build();
    (temp_dir, TableStore::new(config))
}

fn setup_store() -> (TempDir, TableStore) {
    setup_store_with_mode(WriteMode::AtomicRename)
}

fn setup_table() -> (TempDir, TableStore) {
    let (temp, store) = setup_store();
    store.create_table(DB, TABLE).unwrap();
    (temp, store)
}

fn rec(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn table_file(temp: &TempDir) -> PathBuf {
    temp.path().join(DB).join(TABLE)
}

fn ids(records: &[Record]) -> Vec<Value> {
    records.iter().map(|r| r["id"].clone()).collect()
}

// =============================================================================
// Table Lifecycle Tests
// =============================================================================

#[test]
fn test_create_then_read_is_empty() {
    let (temp, store) = setup_store();

    let outcome = store.create_table(DB, TABLE).unwrap();

    assert_eq!(outcome, CreateOutcome::Created);
    assert!(store.read_table(DB, TABLE).unwrap().is_empty());
    assert_eq!(fs::read_to_string(table_file(&temp)).unwrap(), "[]");
}

#[test]
fn test_create_existing_table_does_not_overwrite() {
    let (temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();
    let before = fs::read(table_file(&temp)).unwrap();

    let outcome = store.create_table(DB, TABLE).unwrap();

    assert_eq!(outcome, CreateOutcome::AlreadyExists);
    assert_eq!(fs::read(table_file(&temp)).unwrap(), before);
}

#[test]
fn test_create_table_in_missing_database_is_io_error() {
    let (_temp, store) = setup_store();

    let result = store.create_table("nowhere", TABLE);

    assert!(matches!(result, Err(DbError::Io(_))));
}

#[test]
fn test_create_table_rejects_bad_names() {
    let (_temp, store) = setup_store();

    assert!(matches!(store.create_table("1db", TABLE), Err(DbError::Validation(_))));
    assert!(matches!(store.create_table(DB, "../escape"), Err(DbError::Validation(_))));
    assert!(matches!(store.create_table(DB, ""), Err(DbError::Validation(_))));
}

#[test]
fn test_read_missing_table() {
    let (_temp, store) = setup_store();

    let result = store.read_table(DB, TABLE);

    assert!(matches!(result, Err(DbError::TableNotFound { .. })));
}

#[test]
fn test_read_corrupt_table() {
    let (temp, store) = setup_store();
    fs::write(table_file(&temp), "[{\"id\": 1},").unwrap();

    let result = store.read_table(DB, TABLE);

    assert!(matches!(result, Err(DbError::Parse(_))));
    assert!(!result.unwrap_err().is_recoverable());
}

#[test]
fn test_read_non_array_table() {
    let (temp, store) = setup_store();
    fs::write(table_file(&temp), "{\"id\": 1}").unwrap();

    assert!(matches!(store.read_table(DB, TABLE), Err(DbError::Parse(_))));
}

#[test]
fn test_read_array_with_non_object_element() {
    let (temp, store) = setup_store();
    fs::write(table_file(&temp), "[{\"id\": 1}, \"stray\"]").unwrap();

    assert!(matches!(store.read_table(DB, TABLE), Err(DbError::Parse(_))));
}

#[test]
fn test_delete_table() {
    let (temp, store) = setup_table();

    store.delete_table(DB, TABLE).unwrap();

    assert!(!table_file(&temp).exists());
    assert!(matches!(
        store.delete_table(DB, TABLE),
        Err(DbError::TableNotFound { .. })
    ));
}

#[test]
fn test_rename_table() {
    let (temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();

    let outcome = store.rename_table(DB, TABLE, "pupils.json").unwrap();

    assert_eq!(outcome, RenameOutcome::Renamed);
    assert!(!table_file(&temp).exists());
    let records = store.read_table(DB, "pupils.json").unwrap();
    assert_eq!(ids(&records), vec![json!(1)]);
}

#[test]
fn test_rename_missing_table_is_reported_noop() {
    let (temp, store) = setup_store();

    let outcome = store.rename_table(DB, TABLE, "pupils.json").unwrap();

    assert_eq!(outcome, RenameOutcome::SourceMissing);
    assert!(!temp.path().join(DB).join("pupils.json").exists());
}

#[test]
fn test_rename_onto_existing_table_conflicts() {
    let (temp, store) = setup_table();
    store.create_table(DB, "pupils.json").unwrap();
    store.create_row(DB, "pupils.json", rec(json!({"id": 9}))).unwrap();

    let result = store.rename_table(DB, TABLE, "pupils.json");

    assert!(matches!(result, Err(DbError::Conflict(_))));
    assert!(table_file(&temp).exists());
    let target = store.read_table(DB, "pupils.json").unwrap();
    assert_eq!(ids(&target), vec![json!(9)]);
}

// =============================================================================
// Row Tests
// =============================================================================

#[test]
fn test_create_row_preserves_insertion_order() {
    let (_temp, store) = setup_table();
    let r1 = rec(json!({"id": 1, "name": "Ada"}));
    let r2 = rec(json!({"id": 2, "name": "Grace"}));

    store.create_row(DB, TABLE, r1.clone()).unwrap();
    store.create_row(DB, TABLE, r2.clone()).unwrap();

    assert_eq!(store.read_table(DB, TABLE).unwrap(), vec![r1, r2]);
}

#[test]
fn test_create_row_does_not_require_id() {
    let (_temp, store) = setup_table();

    store.create_row(DB, TABLE, rec(json!({"name": "anon"}))).unwrap();

    assert_eq!(store.read_table(DB, TABLE).unwrap().len(), 1);
}

#[test]
fn test_create_row_missing_table() {
    let (_temp, store) = setup_store();

    let result = store.create_row(DB, TABLE, rec(json!({"id": 1})));

    assert!(matches!(result, Err(DbError::TableNotFound { .. })));
}

#[test]
fn test_create_row_on_corrupt_table_leaves_file() {
    let (temp, store) = setup_store();
    fs::write(table_file(&temp), "not json").unwrap();

    let result = store.create_row(DB, TABLE, rec(json!({"id": 1})));

    assert!(matches!(result, Err(DbError::Parse(_))));
    assert_eq!(fs::read_to_string(table_file(&temp)).unwrap(), "not json");
}

#[test]
fn test_file_is_compact_json() {
    let (temp, store) = setup_table();

    store
        .create_row(DB, TABLE, rec(json!({"id": 1, "name": "A"})))
        .unwrap();

    assert_eq!(
        fs::read_to_string(table_file(&temp)).unwrap(),
        r#"[{"id":1,"name":"A"}]"#
    );
}

#[test]
fn test_update_row_replaces_whole_record_in_place() {
    let (_temp, store) = setup_table();
    store
        .create_row(DB, TABLE, rec(json!({"id": 1, "name": "A"})))
        .unwrap();
    store
        .create_row(DB, TABLE, rec(json!({"id": 2, "name": "B", "age": 30})))
        .unwrap();
    let replacement = rec(json!({"id": 2, "nickname": "bee"}));

    store.update_row(DB, TABLE, &json!(2), replacement.clone()).unwrap();

    let records = store.read_table(DB, TABLE).unwrap();
    assert_eq!(records[0], rec(json!({"id": 1, "name": "A"})));
    assert_eq!(records[1], replacement);
    assert!(!records[1].contains_key("age"));
}

#[test]
fn test_update_first_match_wins_on_duplicate_ids() {
    let (_temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 1, "n": "first"}))).unwrap();
    store.create_row(DB, TABLE, rec(json!({"id": 1, "n": "second"}))).unwrap();

    store
        .update_row(DB, TABLE, &json!(1), rec(json!({"id": 1, "n": "new"})))
        .unwrap();

    let records = store.read_table(DB, TABLE).unwrap();
    assert_eq!(records[0]["n"], json!("new"));
    assert_eq!(records[1]["n"], json!("second"));
}

#[test]
fn test_update_unknown_id_leaves_file_unchanged() {
    let (temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();
    let before = fs::read(table_file(&temp)).unwrap();

    let result = store.update_row(DB, TABLE, &json!(42), rec(json!({"id": 42})));

    let err = result.unwrap_err();
    assert!(matches!(err, DbError::RecordNotFound { .. }));
    assert!(err.is_recoverable());
    assert_eq!(fs::read(table_file(&temp)).unwrap(), before);
}

#[test]
fn test_id_match_is_exact() {
    let (_temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();

    let result = store.update_row(DB, TABLE, &json!("1"), rec(json!({"id": "1"})));

    assert!(matches!(result, Err(DbError::RecordNotFound { .. })));
}

#[test]
fn test_numeric_ids_match_across_integer_and_float() {
    let (temp, store) = setup_store();
    fs::write(table_file(&temp), r#"[{"id":1.0},{"id":2}]"#).unwrap();

    store.delete_row(DB, TABLE, &parse_row_id("1")).unwrap();
    store.delete_row(DB, TABLE, &parse_row_id("2.0")).unwrap();

    assert!(store.read_table(DB, TABLE).unwrap().is_empty());
}

#[test]
fn test_delete_row_keeps_order_of_rest() {
    let (_temp, store) = setup_table();
    for id in 1..=3 {
        store.create_row(DB, TABLE, rec(json!({"id": id}))).unwrap();
    }

    let removed = store.delete_row(DB, TABLE, &json!(2)).unwrap();

    assert_eq!(removed, rec(json!({"id": 2})));
    let records = store.read_table(DB, TABLE).unwrap();
    assert_eq!(ids(&records), vec![json!(1), json!(3)]);
}

#[test]
fn test_delete_row_removes_only_first_duplicate() {
    let (_temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 5, "n": 1}))).unwrap();
    store.create_row(DB, TABLE, rec(json!({"id": 5, "n": 2}))).unwrap();

    store.delete_row(DB, TABLE, &json!(5)).unwrap();

    let records = store.read_table(DB, TABLE).unwrap();
    assert_eq!(records, vec![rec(json!({"id": 5, "n": 2}))]);
}

#[test]
fn test_delete_unknown_id_leaves_file_unchanged() {
    let (temp, store) = setup_table();
    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();
    let before = fs::read(table_file(&temp)).unwrap();

    let result = store.delete_row(DB, TABLE, &json!(7));

    assert!(matches!(result, Err(DbError::RecordNotFound { .. })));
    assert_eq!(fs::read(table_file(&temp)).unwrap(), before);
}

#[test]
fn test_record_key_order_survives_rewrite() {
    let (_temp, store) = setup_table();
    store
        .create_row(DB, TABLE, rec(json!({"zeta": 1, "id": 1, "alpha": 2})))
        .unwrap();
    store.create_row(DB, TABLE, rec(json!({"id": 2}))).unwrap();

    store.delete_row(DB, TABLE, &json!(2)).unwrap();

    let records = store.read_table(DB, TABLE).unwrap();
    let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "id", "alpha"]);
}

// =============================================================================
// Write Mode Tests
// =============================================================================

#[test]
fn test_atomic_rename_leaves_no_temp_file() {
    let (temp, store) = setup_table();

    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();

    let entries: Vec<String> = fs::read_dir(temp.path().join(DB))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec![TABLE.to_string()]);
}

#[test]
fn test_atomic_write_never_touches_sibling_tables() {
    let (_temp, store) = setup_table();
    store.create_table(DB, ".students.json.tmp").unwrap();
    store
        .create_row(DB, ".students.json.tmp", rec(json!({"id": 9})))
        .unwrap();

    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();
    store.update_row(DB, TABLE, &json!(1), rec(json!({"id": 1, "v": 2}))).unwrap();

    let sibling = store.read_table(DB, ".students.json.tmp").unwrap();
    assert_eq!(ids(&sibling), vec![json!(9)]);
    assert_eq!(ids(&store.read_table(DB, TABLE).unwrap()), vec![json!(1)]);
}

#[test]
fn test_create_table_writes_array_in_both_modes() {
    for mode in [WriteMode::AtomicRename, WriteMode::InPlace] {
        let (temp, store) = setup_store_with_mode(mode);

        assert_eq!(store.create_table(DB, TABLE).unwrap(), CreateOutcome::Created);

        let entries: Vec<String> = fs::read_dir(temp.path().join(DB))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![TABLE.to_string()]);
        assert_eq!(fs::read_to_string(table_file(&temp)).unwrap(), "[]");
    }
}

#[test]
fn test_in_place_mode_round_trip() {
    let (_temp, store) = setup_store_with_mode(WriteMode::InPlace);
    store.create_table(DB, TABLE).unwrap();

    store.create_row(DB, TABLE, rec(json!({"id": 1}))).unwrap();
    store.create_row(DB, TABLE, rec(json!({"id": 2}))).unwrap();
    store
        .update_row(DB, TABLE, &json!(1), rec(json!({"id": 1, "x": true})))
        .unwrap();

    let records = store.read_table(DB, TABLE).unwrap();
    assert_eq!(ids(&records), vec![json!(1), json!(2)]);
    assert_eq!(records[0]["x"], json!(true));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_appends_through_one_store_are_not_lost() {
    let (_temp, store) = setup_table();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10 {
                    store
                        .create_row(DB, TABLE, rec(json!({"id": t * 100 + i})))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.read_table(DB, TABLE).unwrap().len(), 40);
    assert_eq!(store.tracked_locks(), 0);
}

#[test]
fn test_idle_table_locks_are_released() {
    let (_temp, store) = setup_store();

    for i in 0..20 {
        let table = format!("t{}", i);
        store.create_table(DB, &table).unwrap();
        store.create_row(DB, &table, rec(json!({"id": i}))).unwrap();
        store.rename_table(DB, &table, &format!("r{}", i)).unwrap();
    }
    let _ = store.read_table(DB, "missing");

    assert_eq!(store.tracked_locks(), 0);
}
