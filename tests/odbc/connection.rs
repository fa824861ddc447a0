use odbc_scanner::{Connection, Error, MAX_CONN_STR_OUT};
use odbc_scanner_test::{environment, Function, MockDriver};

const CONN_STR: &str = "Driver=Mock;Database=test";

#[test]
fn it_connects_and_keeps_the_completed_string() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;

    let conn = Connection::open(&env, CONN_STR)?;

    assert!(conn.is_allocated());
    assert!(conn.is_dialed());
    assert!(mock.is_connected(conn.handle()));
    assert_eq!(conn.completed_connection_string(), Some(CONN_STR));

    Ok(())
}

#[test]
fn it_truncates_the_completed_string() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let long = format!("Driver=Mock;Comment={}", "x".repeat(2 * MAX_CONN_STR_OUT));

    let conn = Connection::open(&env, &long)?;

    assert_eq!(
        conn.completed_connection_string().map(str::len),
        Some(MAX_CONN_STR_OUT)
    );

    Ok(())
}

#[test]
fn it_rejects_dial_before_init() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let mut conn = Connection::new(env);

    let err = conn.dial(CONN_STR).unwrap_err();

    assert!(matches!(
        err,
        Error::Sequence {
            operation: "Connection::dial",
            ..
        }
    ));
    assert_eq!(mock.count(Function::DriverConnect), 0);

    Ok(())
}

#[test]
fn it_rejects_a_second_dial() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let mut conn = Connection::open(&env, CONN_STR)?;

    let err = conn.dial(CONN_STR).unwrap_err();

    assert!(matches!(err, Error::Sequence { .. }));
    assert_eq!(mock.count(Function::DriverConnect), 1);

    Ok(())
}

#[test]
fn it_disconnects_once() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let mut conn = Connection::open(&env, CONN_STR)?;

    conn.disconnect()?;
    conn.disconnect()?;

    assert!(!conn.is_dialed());
    assert_eq!(mock.count(Function::Disconnect), 1);

    Ok(())
}

#[test]
fn it_disconnects_before_freeing_on_drop() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let conn = Connection::open(&env, CONN_STR)?;
    let handle = conn.handle();
    mock.clear_calls();

    drop(conn);

    let calls = mock.calls();
    assert_eq!(
        calls.iter().map(|c| c.function).collect::<Vec<_>>(),
        vec![Function::Disconnect, Function::FreeHandle]
    );
    assert!(calls.iter().all(|c| c.handle == handle));
    assert_eq!(mock.live_handles(), 1);

    Ok(())
}

#[test]
fn it_still_frees_when_disconnect_fails() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let conn = Connection::open(&env, CONN_STR)?;
    mock.clear_calls();
    mock.fail_on(Function::Disconnect, "08S01", 10054, "communication link failure");

    let err = conn.close().unwrap_err();

    assert_eq!(err.as_driver_error().and_then(|e| e.state()), Some("08S01"));
    assert_eq!(
        mock.functions(),
        vec![Function::Disconnect, Function::FreeHandle]
    );

    Ok(())
}

#[test]
fn it_reports_dial_diagnostics() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    mock.fail_on(Function::DriverConnect, "08001", 17, "server does not exist");

    let err = Connection::open(&env, CONN_STR).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Connection::dial SQLDriverConnect: State: 08001, Native error: 17, Message: server does not exist"
    );
    // the half-open connection was released, no disconnect was attempted
    assert_eq!(mock.count(Function::Disconnect), 0);
    assert_eq!(mock.live_handles(), 1);

    Ok(())
}

#[test]
fn it_accepts_success_with_info() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    mock.info_on(Function::DriverConnect, "01S00", "invalid connection string attribute");

    let conn = Connection::open(&env, CONN_STR)?;

    assert!(conn.is_dialed());

    Ok(())
}

#[test]
fn it_keeps_the_environment_alive() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let env_handle = env.handle();
    let conn = Connection::open(&env, CONN_STR)?;
    let conn_handle = conn.handle();

    drop(env);
    assert!(conn.environment().is_allocated());
    assert_eq!(mock.live_handles(), 2);

    mock.clear_calls();
    drop(conn);

    let freed: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|c| c.function == Function::FreeHandle)
        .map(|c| c.handle)
        .collect();
    assert_eq!(freed, vec![conn_handle, env_handle]);
    assert_eq!(mock.live_handles(), 0);

    Ok(())
}
