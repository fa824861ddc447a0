use chrono::{NaiveDate, NaiveTime};
use odbc_scanner::{CType, Error, SqlType, StatementOptions, Value};
use odbc_scanner_test::{new_db, Function, MockColumn, MockDriver, MockResult, MockValue};
use std::sync::Arc;

const SELECT: &str = "SELECT id, name FROM t";

fn mock() -> Arc<MockDriver> {
    let mock = MockDriver::new();
    mock.register_result(
        SELECT,
        MockResult::new(vec![
            MockColumn::new("id", SqlType::INTEGER, 10),
            MockColumn::new("name", SqlType::VARCHAR, 20),
        ])
        .row(vec![1.into(), "alpha".into()])
        .row(vec![2.into(), "beta".into()])
        .row(vec![3.into(), MockValue::Null]),
    );
    mock
}

fn pragma(mock: &MockDriver, name: &str, value: i64) {
    mock.register_result(
        &format!("PRAGMA {}", name),
        MockResult::new(vec![MockColumn::new(name, SqlType::BIGINT, 19)])
            .row(vec![value.into()]),
    );
}

#[test]
fn it_scans_in_blocks() -> anyhow::Result<()> {
    let mock = mock();
    let db = new_db(&mock)?;

    let mut scan = db.query(SELECT, StatementOptions::new(2))?;

    let types: Vec<_> = scan.columns().iter().map(|c| (c.c_type(), c.length())).collect();
    assert_eq!(types, vec![(CType::Long, 4), (CType::Char, 21)]);

    let first = scan.next_chunk()?.expect("first block");
    assert_eq!(first.len(), 2);
    assert_eq!(
        first.column(0),
        Some(&[Value::Integer(1), Value::Integer(2)][..])
    );
    assert_eq!(first.value(1, 1), Some(&Value::Text("beta".into())));

    let second = scan.next_chunk()?.expect("second block");
    assert_eq!(second.len(), 1);
    assert_eq!(second.row(0), Some(vec![Value::Integer(3), Value::Null]));

    assert!(scan.next_chunk()?.is_none());
    assert!(scan.next_chunk()?.is_none());
    assert_eq!(mock.count(Function::FetchScroll), 3);

    Ok(())
}

#[test]
fn it_collects_every_block() -> anyhow::Result<()> {
    let mock = mock();
    let db = new_db(&mock)?;

    let all = db.query(SELECT, StatementOptions::new(1))?.collect_all()?;

    assert_eq!(all.len(), 3);
    assert_eq!(all.column_count(), 2);
    assert_eq!(
        all.column(1),
        Some(&[Value::Text("alpha".into()), Value::Text("beta".into()), Value::Null][..])
    );

    Ok(())
}

#[test]
fn it_decodes_every_mapped_type() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let date = NaiveDate::from_ymd_opt(2023, 7, 14).unwrap();
    let time = NaiveTime::from_hms_opt(13, 37, 42).unwrap();
    let timestamp = date.and_hms_micro_opt(8, 30, 0, 250_000).unwrap();

    mock.register_result(
        "SELECT * FROM everything",
        MockResult::new(vec![
            MockColumn::new("small", SqlType::SMALLINT, 5),
            MockColumn::new("big", SqlType::BIGINT, 19),
            MockColumn::new("real", SqlType::REAL, 7),
            MockColumn::new("double", SqlType::DOUBLE, 15),
            MockColumn::new("price", SqlType::DECIMAL, 10).decimal_digits(2),
            MockColumn::new("payload", SqlType::VARBINARY, 4),
            MockColumn::new("day", SqlType::TYPE_DATE, 10),
            MockColumn::new("at", SqlType::TYPE_TIME, 8),
            MockColumn::new("ts", SqlType::TYPE_TIMESTAMP, 26),
        ])
        .row(vec![
            MockValue::Int(-3),
            MockValue::Int(9_007_199_254_740_993),
            MockValue::Double(1.5),
            MockValue::Double(-0.25),
            MockValue::Text("1234.5".into()),
            MockValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            MockValue::Date(date),
            MockValue::Time(time),
            MockValue::Timestamp(timestamp),
        ])
        .row(vec![MockValue::Null; 9]),
    );
    let db = new_db(&mock)?;

    let chunk = db
        .query("SELECT * FROM everything", StatementOptions::new(4))?
        .collect_all()?;

    assert_eq!(
        chunk.row(0),
        Some(vec![
            Value::SmallInt(-3),
            Value::BigInt(9_007_199_254_740_993),
            Value::Float(1.5),
            Value::Double(-0.25),
            Value::Text("1234.5".into()),
            Value::Blob(vec![0xde, 0xad, 0xbe, 0xef]),
            Value::Date(date),
            Value::Time(time),
            Value::Timestamp(timestamp),
        ])
    );
    assert!(chunk.row(1).unwrap().iter().all(Value::is_null));

    Ok(())
}

#[test]
fn it_truncates_text_to_the_declared_size() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    mock.register_result(
        "SELECT code FROM t",
        MockResult::new(vec![MockColumn::new("code", SqlType::CHAR, 3)])
            .row(vec!["abcdef".into()]),
    );
    let db = new_db(&mock)?;

    let chunk = db
        .query("SELECT code FROM t", StatementOptions::new(1))?
        .collect_all()?;

    assert_eq!(chunk.value(0, 0), Some(&Value::Text("abc".into())));

    Ok(())
}

#[test]
fn it_surfaces_conversion_failures() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    mock.register_result(
        "SELECT n FROM t",
        MockResult::new(vec![MockColumn::new("n", SqlType::INTEGER, 10)])
            .row(vec!["not a number".into()]),
    );
    let db = new_db(&mock)?;
    let mut scan = db.query("SELECT n FROM t", StatementOptions::new(1))?;

    let err = scan.next_chunk().unwrap_err();

    assert_eq!(err.as_driver_error().and_then(|e| e.state()), Some("07006"));
    assert!(err.to_string().starts_with("Statement::fetch SQLFetchScroll: "));

    Ok(())
}

#[test]
fn it_runs_pragmas() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    pragma(&mock, "page_count", 42);
    let db = new_db(&mock)?;

    assert_eq!(db.run_pragma("page_count")?, 42);
    // the statement is released once the pragma is read
    assert_eq!(mock.live_handles(), 2);

    Ok(())
}

#[test]
fn it_fails_pragmas_without_rows() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    mock.register_result(
        "PRAGMA page_size",
        MockResult::new(vec![MockColumn::new("page_size", SqlType::BIGINT, 19)]),
    );
    let db = new_db(&mock)?;

    let err = db.run_pragma("page_size").unwrap_err();

    assert!(matches!(err, Error::Internal(_)));

    Ok(())
}

#[test]
fn it_passes_writes_through() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let db = new_db(&mock)?;

    db.execute("DELETE FROM t WHERE id = 1")?;

    assert_eq!(mock.count(Function::Execute), 1);
    assert_eq!(mock.count(Function::FetchScroll), 0);
    assert_eq!(mock.live_handles(), 2);

    Ok(())
}

#[test]
fn it_sizes_temporal_buffers_for_the_whole_struct() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let day = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
    let at = NaiveTime::from_hms_opt(3, 4, 5).unwrap();
    let ts = day.and_hms_nano_opt(6, 7, 8, 9).unwrap();

    // drivers may report a size of 0 for temporal columns
    mock.register_result(
        "SELECT day, at, ts FROM events",
        MockResult::new(vec![
            MockColumn::new("day", SqlType::TYPE_DATE, 0),
            MockColumn::new("at", SqlType::TYPE_TIME, 0),
            MockColumn::new("ts", SqlType::TYPE_TIMESTAMP, 0),
        ])
        .row(vec![
            MockValue::Date(day),
            MockValue::Time(at),
            MockValue::Timestamp(ts),
        ])
        .row(vec![
            MockValue::Date(day.succ_opt().unwrap()),
            MockValue::Null,
            MockValue::Timestamp(ts),
        ]),
    );
    let db = new_db(&mock)?;

    let mut scan = db.query("SELECT day, at, ts FROM events", StatementOptions::new(2))?;
    let lengths: Vec<_> = scan.columns().iter().map(|c| c.length()).collect();
    assert_eq!(lengths, vec![1, 1, 1]);

    let chunk = scan.next_chunk()?.expect("one block");
    assert_eq!(chunk.len(), 2);
    assert_eq!(
        chunk.row(0),
        Some(vec![Value::Date(day), Value::Time(at), Value::Timestamp(ts)])
    );
    assert_eq!(
        chunk.row(1),
        Some(vec![
            Value::Date(day.succ_opt().unwrap()),
            Value::Null,
            Value::Timestamp(ts),
        ])
    );

    Ok(())
}
