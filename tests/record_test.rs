//! Integration tests for the record manager

use std::path::PathBuf;

use minirel::record::{Attribute, Record, Schema, Table, Value};
use minirel::{DataType, DbError, Rid};
use tempfile::TempDir;

fn test_schema() -> Schema {
    Schema::new(
        vec![
            Attribute::new("a", DataType::Int, 0).unwrap(),
            Attribute::new("b", DataType::String, 4).unwrap(),
        ],
        vec![0],
    )
    .unwrap()
}

fn setup(schema: &Schema) -> (TempDir, PathBuf, Table) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.tbl");
    Table::create(&path, schema).unwrap();
    let table = Table::open(&path).unwrap();
    (dir, path, table)
}

fn make_record(table: &Table, a: i32, b: &str) -> Record {
    let mut record = Record::new(table.schema());
    record.set_attr(table.schema(), 0, &Value::Int(a)).unwrap();
    record
        .set_attr(table.schema(), 1, &Value::String(b.into()))
        .unwrap();
    record
}

#[test]
fn test_record_round_trip() {
    let schema = test_schema();
    let (_dir, _path, table) = setup(&schema);

    let mut record = make_record(&table, 42, "abcd");
    let rid = table.insert(&mut record).unwrap();
    assert_eq!(rid, Rid::new(1, 0));
    assert_eq!(record.id, rid);

    let fetched = table.get(rid).unwrap();
    assert_eq!(fetched.get_attr(&schema, 0).unwrap(), Value::Int(42));
    assert_eq!(
        fetched.get_attr(&schema, 1).unwrap(),
        Value::String("abcd".into())
    );

    table.delete(rid).unwrap();
    assert!(matches!(
        table.get(rid),
        Err(DbError::NoTupleWithGivenRid(_))
    ));
    assert_eq!(table.num_tuples(), 0);

    table.close().unwrap();
}

#[test]
fn test_inserts_fill_slots_in_order() {
    let schema = test_schema();
    let (_dir, _path, table) = setup(&schema);

    for i in 0..5 {
        let mut record = make_record(&table, i, "xxxx");
        let rid = table.insert(&mut record).unwrap();
        assert_eq!(rid, Rid::new(1, i));
    }
    assert_eq!(table.num_tuples(), 5);

    table.close().unwrap();
}

#[test]
fn test_update_in_place() {
    let schema = test_schema();
    let (_dir, _path, table) = setup(&schema);

    let mut record = make_record(&table, 1, "old_");
    let rid = table.insert(&mut record).unwrap();

    record.set_attr(&schema, 1, &Value::String("new_".into())).unwrap();
    table.update(&record).unwrap();

    let fetched = table.get(rid).unwrap();
    assert_eq!(
        fetched.get_attr(&schema, 1).unwrap(),
        Value::String("new_".into())
    );
    assert_eq!(table.num_tuples(), 1);

    table.close().unwrap();
}

#[test]
fn test_insert_spills_to_next_page() {
    // two slots per page: tombstone + 4 + 2040 = 2045 bytes per record
    let schema = Schema::new(
        vec![
            Attribute::new("k", DataType::Int, 0).unwrap(),
            Attribute::new("pad", DataType::String, 2040).unwrap(),
        ],
        vec![0],
    )
    .unwrap();
    assert_eq!(schema.slots_per_page(), 2);

    let (_dir, _path, table) = setup(&schema);

    let mut rids = Vec::new();
    for i in 0..3 {
        let mut record = Record::new(&schema);
        record.set_attr(&schema, 0, &Value::Int(i)).unwrap();
        record
            .set_attr(&schema, 1, &Value::String("p".into()))
            .unwrap();
        rids.push(table.insert(&mut record).unwrap());
    }

    assert_eq!(rids, vec![Rid::new(1, 0), Rid::new(1, 1), Rid::new(2, 0)]);

    for (i, rid) in rids.iter().enumerate() {
        let fetched = table.get(*rid).unwrap();
        assert_eq!(fetched.get_attr(&schema, 0).unwrap(), Value::Int(i as i32));
    }

    table.close().unwrap();
}

#[test]
fn test_delete_biases_insert_toward_hole() {
    let schema = test_schema();
    let (_dir, _path, table) = setup(&schema);

    for i in 0..3 {
        table.insert(&mut make_record(&table, i, "yyyy")).unwrap();
    }

    table.delete(Rid::new(1, 1)).unwrap();

    let mut replacement = make_record(&table, 9, "zzzz");
    let rid = table.insert(&mut replacement).unwrap();
    assert_eq!(rid, Rid::new(1, 1));

    let fetched = table.get(rid).unwrap();
    assert_eq!(fetched.get_attr(&schema, 0).unwrap(), Value::Int(9));

    table.close().unwrap();
}

#[test]
fn test_table_persists_across_close() {
    let schema = test_schema();
    let (_dir, path, table) = setup(&schema);

    let rid = table.insert(&mut make_record(&table, 7, "keep")).unwrap();
    table.insert(&mut make_record(&table, 8, "also")).unwrap();
    table.close().unwrap();

    let reopened = Table::open(&path).unwrap();
    assert_eq!(reopened.schema(), &schema);
    assert_eq!(reopened.num_tuples(), 2);

    let fetched = reopened.get(rid).unwrap();
    assert_eq!(fetched.get_attr(&schema, 0).unwrap(), Value::Int(7));
    assert_eq!(
        fetched.get_attr(&schema, 1).unwrap(),
        Value::String("keep".into())
    );

    reopened.close().unwrap();
}

#[test]
fn test_get_rejects_out_of_range_rids() {
    let schema = test_schema();
    let (_dir, _path, table) = setup(&schema);

    let slots = schema.slots_per_page() as i32;
    assert!(matches!(
        table.get(Rid::new(1, slots)),
        Err(DbError::InvalidParameter(_))
    ));
    assert!(matches!(
        table.get(Rid::new(0, 0)),
        Err(DbError::InvalidParameter(_))
    ));
    assert!(matches!(
        table.get(Rid::new(-1, 0)),
        Err(DbError::InvalidParameter(_))
    ));

    table.close().unwrap();
}

#[test]
fn test_delete_table_removes_file() {
    let schema = test_schema();
    let (_dir, path, table) = setup(&schema);

    table.close().unwrap();
    Table::destroy(&path).unwrap();
    assert!(!path.exists());
    assert!(matches!(Table::open(&path), Err(DbError::FileNotFound(_))));
}
