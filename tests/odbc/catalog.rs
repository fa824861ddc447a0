use odbc_scanner::{
    AccessMode, DatabaseSize, Error, OdbcCatalog, OdbcScanOptions, OdbcTransaction,
    OnEntryNotFound, SqlType, StatementOptions,
};
use odbc_scanner_test::{environment, Function, MockColumn, MockDriver, MockResult};
use std::sync::{Arc, Barrier};

const IN_MEMORY_CONN_STR: &str = "Driver=Mock;Database=:memory:";

fn attach(
    mock: &Arc<MockDriver>,
    path: &str,
    access_mode: AccessMode,
) -> anyhow::Result<OdbcCatalog> {
    let env = environment(mock)?;
    let mut options: OdbcScanOptions = path.parse()?;
    options.in_memory_connection_string(IN_MEMORY_CONN_STR);
    Ok(OdbcCatalog::attach(&env, options, access_mode)?)
}

fn in_memory(mock: &Arc<MockDriver>) -> anyhow::Result<OdbcCatalog> {
    attach(mock, ":memory:", AccessMode::ReadWrite)
}

fn pragma(mock: &MockDriver, name: &str, value: i64) {
    mock.register_result(
        &format!("PRAGMA {}", name),
        MockResult::new(vec![MockColumn::new(name, SqlType::BIGINT, 19)])
            .row(vec![value.into()]),
    );
}

#[test]
fn it_dials_the_in_memory_connection_on_attach() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;

    assert!(catalog.in_memory());
    assert_eq!(catalog.path(), ":memory:");

    let dials: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|c| c.function == Function::DriverConnect)
        .filter_map(|c| c.detail)
        .collect();
    assert_eq!(dials, vec![IN_MEMORY_CONN_STR.to_string()]);

    Ok(())
}

#[test]
fn it_hands_out_the_in_memory_database_once() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;

    let db = catalog.get_in_memory_database()?;
    assert!(db.connection().is_dialed());
    let handle = db.connection().handle();

    let err = catalog.get_in_memory_database().unwrap_err();
    match err {
        Error::Transaction(message) => assert_eq!(
            message,
            "Only a single transaction can be active on an in-memory Odbc database at a time"
        ),
        other => panic!("expected a transaction error, got {:?}", other),
    }

    catalog.release_in_memory_database(db)?;
    let again = catalog.get_in_memory_database()?;
    assert_eq!(again.connection().handle(), handle);
    again.release()?;

    Ok(())
}

#[test]
fn it_releases_the_in_memory_database_on_drop() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;

    drop(catalog.get_in_memory_database()?);

    assert!(catalog.get_in_memory_database().is_ok());

    Ok(())
}

#[test]
fn it_rejects_a_release_on_the_wrong_catalog() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let first = in_memory(&mock)?;
    let second = in_memory(&mock)?;

    let db = first.get_in_memory_database()?;
    assert!(matches!(
        second.release_in_memory_database(db),
        Err(Error::Internal(_))
    ));

    // the rejected guard still gave its connection back to `first`
    assert!(first.get_in_memory_database().is_ok());

    Ok(())
}

#[test]
fn it_lets_exactly_one_acquirer_win() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;
    let before = Barrier::new(2);
    let after = Barrier::new(2);

    let wins = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    before.wait();
                    let db = catalog.get_in_memory_database();
                    // hold the winner until both have tried
                    after.wait();
                    db.is_ok()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count()
    });
    assert_eq!(wins, 1);

    assert!(catalog.get_in_memory_database().is_ok());

    Ok(())
}

#[test]
fn it_ignores_in_memory_calls_on_remote_attachments() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = attach(&mock, "odbc:warehouse", AccessMode::ReadOnly)?;

    assert!(!catalog.in_memory());
    assert_eq!(catalog.path(), "DSN=warehouse");
    assert_eq!(mock.count(Function::DriverConnect), 0);

    assert!(matches!(
        catalog.get_in_memory_database(),
        Err(Error::Internal(_))
    ));

    Ok(())
}

#[test]
fn it_holds_the_in_memory_database_while_a_scan_is_open() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    mock.register_result(
        "SELECT id FROM t",
        MockResult::new(vec![MockColumn::new("id", SqlType::INTEGER, 10)])
            .row(vec![1.into()])
            .row(vec![2.into()]),
    );
    let catalog = in_memory(&mock)?;

    let tx = OdbcTransaction::start(&catalog)?;
    let mut scan = tx.db().query("SELECT id FROM t", StatementOptions::new(1))?;
    assert!(scan.next_chunk()?.is_some());

    assert!(matches!(
        OdbcTransaction::start(&catalog),
        Err(Error::Transaction(_))
    ));

    // the transaction can only end once the scan is gone
    drop(scan);
    assert_eq!(mock.live_handles(), 2);
    tx.commit()?;

    let next = OdbcTransaction::start(&catalog)?;
    let rows = next
        .db()
        .query("SELECT id FROM t", StatementOptions::new(4))?
        .collect_all()?;
    assert_eq!(rows.len(), 2);
    next.rollback()?;

    Ok(())
}

#[test]
fn it_keeps_the_guard_until_its_scans_are_dropped() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    mock.register_result(
        "SELECT id FROM t",
        MockResult::new(vec![MockColumn::new("id", SqlType::INTEGER, 10)]).row(vec![1.into()]),
    );
    let catalog = in_memory(&mock)?;

    let db = catalog.get_in_memory_database()?;
    let scan = db.query("SELECT id FROM t", StatementOptions::new(1))?;
    assert!(catalog.get_in_memory_database().is_err());

    drop(scan);
    drop(db);
    assert!(catalog.get_in_memory_database().is_ok());

    Ok(())
}

#[test]
fn it_serializes_in_memory_transactions() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;

    let first = OdbcTransaction::start(&catalog)?;
    assert!(matches!(
        OdbcTransaction::start(&catalog),
        Err(Error::Transaction(_))
    ));
    first.commit()?;

    let second = OdbcTransaction::start(&catalog)?;
    drop(second);

    let third = OdbcTransaction::start(&catalog)?;
    third.rollback()?;

    // every transaction shared the connection dialed on attach
    assert_eq!(mock.count(Function::DriverConnect), 1);

    Ok(())
}

#[test]
fn it_opens_a_connection_per_remote_transaction() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = attach(&mock, "odbc:DSN=warehouse;UID=scanner", AccessMode::ReadOnly)?;

    let first = OdbcTransaction::start(&catalog)?;
    let second = OdbcTransaction::start(&catalog)?;

    assert_eq!(mock.count(Function::DriverConnect), 2);
    assert!(!Arc::ptr_eq(first.db().connection(), second.db().connection()));

    first.commit()?;
    second.rollback()?;
    assert_eq!(mock.count(Function::Disconnect), 2);

    Ok(())
}

#[test]
fn it_refuses_writes_on_read_only_attachments() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = attach(&mock, "odbc:warehouse", AccessMode::ReadOnly)?;
    let tx = OdbcTransaction::start(&catalog)?;

    assert!(matches!(
        tx.execute("DELETE FROM t"),
        Err(Error::Transaction(_))
    ));
    assert_eq!(mock.count(Function::Prepare), 0);

    Ok(())
}

#[test]
fn it_passes_writes_through_on_read_write_attachments() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;
    let tx = OdbcTransaction::start(&catalog)?;

    tx.execute("UPDATE t SET name = 'x' WHERE id = 1")?;

    let executed: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|c| c.function == Function::Execute)
        .filter_map(|c| c.detail)
        .collect();
    assert_eq!(executed, vec!["UPDATE t SET name = 'x' WHERE id = 1"]);
    tx.commit()?;

    Ok(())
}

#[test]
fn it_exposes_a_single_schema() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let catalog = in_memory(&mock)?;

    let main = catalog.get_schema("main", OnEntryNotFound::ThrowException)?;
    assert_eq!(main.map(|s| s.name()), Some("main"));
    assert!(catalog.get_schema("", OnEntryNotFound::ThrowException)?.is_some());
    assert!(catalog.get_schema("other", OnEntryNotFound::ReturnNull)?.is_none());

    match catalog.get_schema("other", OnEntryNotFound::ThrowException) {
        Err(Error::Binder(message)) => {
            assert_eq!(message, "Odbc databases only have a single schema - \"main\"")
        }
        other => panic!("expected a binder error, got {:?}", other),
    }

    assert!(matches!(catalog.create_schema("other"), Err(Error::Binder(_))));
    assert!(matches!(catalog.drop_schema("main"), Err(Error::Binder(_))));

    let mut seen = Vec::new();
    catalog.scan_schemas(|schema| seen.push(schema.name().to_string()));
    assert_eq!(seen, vec!["main"]);

    Ok(())
}

#[test]
fn it_reports_the_database_size() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    pragma(&mock, "page_count", 100);
    pragma(&mock, "page_size", 4096);
    pragma(&mock, "freelist_count", 10);
    let catalog = in_memory(&mock)?;
    let tx = OdbcTransaction::start(&catalog)?;

    let size = catalog.database_size(&tx)?;

    assert_eq!(
        size,
        DatabaseSize {
            total_blocks: 100,
            block_size: 4096,
            free_blocks: 10,
            used_blocks: 90,
            bytes: 409_600,
            wal_size: None,
        }
    );
    tx.commit()?;

    Ok(())
}

#[test]
fn it_rejects_a_database_size_that_overflows() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    pragma(&mock, "page_count", i64::MAX);
    pragma(&mock, "page_size", 4096);
    pragma(&mock, "freelist_count", 0);
    let catalog = in_memory(&mock)?;
    let tx = OdbcTransaction::start(&catalog)?;

    match catalog.database_size(&tx) {
        Err(Error::Internal(message)) => assert!(message.contains("overflows")),
        other => panic!("expected an internal error, got {:?}", other),
    }
    tx.rollback()?;

    Ok(())
}
