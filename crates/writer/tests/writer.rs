//! Data writer against a real SQLite database
mod common;

use common::SqliteConnection;
use quarry_query::ColumnList;
use quarry_value::{ColumnType, DataTable, Value};
use quarry_writer::{ColumnDef, DataWriter, Error, TableDef, WriteMode, WriterInfo, WriterState};

fn people(mode: WriteMode, pulse: usize) -> WriterInfo {
    WriterInfo::builder("People")
        .columns(ColumnList::parse("Id,Name,Score").unwrap())
        .search_columns(ColumnList::parse("Id").unwrap())
        .mode(mode)
        .pulse_row_count(pulse)
        .build()
        .unwrap()
}

fn write_person<C: quarry_writer::Connection>(writer: &mut DataWriter<C>, id: i64, name: &str) {
    writer
        .set_values([Value::I64(id), Value::from(name), Value::Null])
        .unwrap();
    writer.write().unwrap();
}

#[test]
fn test_pulsed_insert() {
    let mut db = SqliteConnection::with_people();
    {
        let mut writer = DataWriter::new(people(WriteMode::Insert, 20), &mut db);
        for id in 0..100 {
            write_person(&mut writer, id, "new");
        }
        writer.finish().unwrap();
        assert_eq!(writer.pulse_count(), 5);
        assert_eq!(writer.rows_written(), 100);
        assert_eq!(writer.rows_affected(), 100);
        assert_eq!(writer.state(), WriterState::Finished);
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM People"), 100);
    assert_eq!(db.commits, 5);
    assert_eq!(db.rollbacks, 0);
}

#[test]
fn test_update_skips_missing_keys() {
    let mut db = SqliteConnection::with_people();
    db.seed_people(0..1000);
    {
        let mut writer = DataWriter::new(people(WriteMode::Update, 100), &mut db);
        for i in 0..600 {
            // even positions hit existing rows
            let id = if i % 2 == 0 { i } else { 10_000 + i };
            write_person(&mut writer, id, "updated");
        }
        writer.finish().unwrap();
        assert_eq!(writer.rows_written(), 600);
        assert_eq!(writer.rows_affected(), 300);
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM People"), 1000);
    assert_eq!(db.count("SELECT COUNT(*) FROM People WHERE Name = 'updated'"), 300);
}

#[test]
fn test_insert_or_update() {
    let mut db = SqliteConnection::with_people();
    db.seed_people(0..3);
    {
        let mut writer = DataWriter::new(people(WriteMode::InsertOrUpdate, 0), &mut db);
        for id in 2..7 {
            write_person(&mut writer, id, "merged");
        }
        writer.finish().unwrap();
        assert_eq!(writer.rows_affected(), 5);
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM People"), 7);
    assert_eq!(db.count("SELECT COUNT(*) FROM People WHERE Name = 'seed'"), 2);
    assert_eq!(db.count("SELECT COUNT(*) FROM People WHERE Name = 'merged'"), 5);
}

#[test]
fn test_insert_or_update_with_only_keys() {
    let mut db = SqliteConnection::open();
    db.batch("CREATE TABLE Tags (Tag TEXT NOT NULL)");
    let info = WriterInfo::builder("Tags")
        .columns(ColumnList::parse("Tag").unwrap())
        .search_columns(ColumnList::parse("Tag").unwrap())
        .mode(WriteMode::InsertOrUpdate)
        .build()
        .unwrap();
    {
        let mut writer = DataWriter::new(info, &mut db);
        for tag in ["a", "b", "a", "c", "b"] {
            writer.set_value(0, tag).unwrap();
            writer.write().unwrap();
        }
        writer.finish().unwrap();
        assert_eq!(writer.rows_written(), 5);
        assert_eq!(writer.rows_affected(), 3);
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM Tags"), 3);
}

#[test]
fn test_update_with_null_key() {
    let mut db = SqliteConnection::open();
    db.batch(
        "CREATE TABLE Codes (Code TEXT, Label TEXT);
         INSERT INTO Codes VALUES (NULL, 'none'), ('x', 'ex');",
    );
    let info = WriterInfo::builder("Codes")
        .columns(ColumnList::parse("Code,Label").unwrap())
        .search_columns(ColumnList::parse("Code").unwrap())
        .mode(WriteMode::Update)
        .build()
        .unwrap();
    {
        let mut writer = DataWriter::new(info, &mut db);
        writer.set_values([Value::Null, Value::from("blank")]).unwrap();
        writer.write().unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.rows_affected(), 1);
    }
    assert_eq!(db.text("SELECT Label FROM Codes WHERE Code IS NULL").as_deref(), Some("blank"));
    assert_eq!(db.text("SELECT Label FROM Codes WHERE Code = 'x'").as_deref(), Some("ex"));
}

#[test]
fn test_drop_rolls_back_unfinished_batch() {
    let mut db = SqliteConnection::with_people();
    {
        let mut writer = DataWriter::new(people(WriteMode::Insert, 10), &mut db);
        for id in 0..25 {
            write_person(&mut writer, id, "partial");
        }
        assert_eq!(writer.pulse_count(), 2);
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM People"), 20);
    assert_eq!(db.commits, 2);
    assert_eq!(db.rollbacks, 1);
}

#[test]
fn test_dispose_without_writes_touches_nothing() {
    let mut db = SqliteConnection::with_people();
    {
        let mut writer = DataWriter::new(people(WriteMode::Insert, 0), &mut db);
        writer.dispose();
        assert_eq!(writer.state(), WriterState::Disposed);
        assert!(matches!(writer.write(), Err(Error::InvalidState { .. })));
    }
    assert_eq!(db.commits + db.rollbacks, 0);
}

#[test]
fn test_finish_twice_fails() {
    let mut db = SqliteConnection::with_people();
    let mut writer = DataWriter::new(people(WriteMode::Insert, 0), &mut db);
    write_person(&mut writer, 1, "once");
    writer.finish().unwrap();
    assert!(matches!(writer.finish(), Err(Error::InvalidState { .. })));
    assert!(matches!(writer.write(), Err(Error::InvalidState { .. })));
}

#[test]
fn test_database_errors_surface() {
    let mut db = SqliteConnection::with_people();
    db.seed_people([1]);
    let mut writer = DataWriter::new(people(WriteMode::Insert, 0), &mut db);
    let result = {
        writer.set_values([Value::I64(1), Value::from("dup"), Value::Null]).unwrap();
        writer.write()
    };
    assert!(matches!(result, Err(Error::Connection(_))));
}

#[test]
fn test_load_from_table() {
    let mut source = DataTable::new(["Name", "Unused", "Id"]).unwrap();
    for (id, name) in [(1, "one"), (2, "two"), (3, "three")] {
        source
            .add_row(vec![Value::from(name), Value::Bool(true), Value::I64(id)])
            .unwrap();
    }
    let mut db = SqliteConnection::with_people();
    {
        let mut writer = DataWriter::new(people(WriteMode::Insert, 2), &mut db);
        assert_eq!(writer.load_from(&mut source.reader()).unwrap(), 3);
        writer.finish().unwrap();
        assert_eq!(writer.pulse_count(), 1);
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM People"), 3);
    assert_eq!(db.count("SELECT COUNT(*) FROM People WHERE Score IS NULL"), 3);
    assert_eq!(db.text("SELECT Name FROM People WHERE Id = 3").as_deref(), Some("three"));
}

#[test]
fn test_schema_converts_and_defaults() {
    let table = TableDef::new(
        "People",
        vec![
            ColumnDef::new("Id", ColumnType::Int).nullable(false),
            ColumnDef::new("Name", ColumnType::String)
                .default("anonymous")
                .max_length(10),
            ColumnDef::new("Score", ColumnType::Float),
        ],
    )
    .unwrap();
    let mut db = SqliteConnection::with_people();
    {
        let mut writer = DataWriter::new(people(WriteMode::Insert, 0), &mut db)
            .with_schema(&table)
            .unwrap();
        writer.set_values([Value::I64(1), Value::Null, Value::I64(3)]).unwrap();
        writer.write().unwrap();
        writer
            .set_values([Value::I64(2), Value::from("far too long a name"), Value::Null])
            .unwrap();
        assert!(matches!(writer.write(), Err(Error::ValueTooLong { max: 10, .. })));
        writer.finish().unwrap();
    }
    assert_eq!(db.text("SELECT Name FROM People WHERE Id = 1").as_deref(), Some("anonymous"));
    assert_eq!(db.real("SELECT Score FROM People WHERE Id = 1"), Some(3.0));
    assert_eq!(db.count("SELECT COUNT(*) FROM People"), 1);
}

#[test]
fn test_schema_must_cover_writer_columns() {
    let table = TableDef::new(
        "People",
        vec![
            ColumnDef::new("Id", ColumnType::Int),
            ColumnDef::new("Name", ColumnType::String),
        ],
    )
    .unwrap();
    let mut db = SqliteConnection::with_people();
    let result = DataWriter::new(people(WriteMode::Insert, 0), &mut db).with_schema(&table);
    assert!(matches!(result, Err(Error::ColumnNotFound(name)) if name == "Score"));
}
