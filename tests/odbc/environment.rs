use odbc_scanner::{Driver, Environment, Error, SqlReturn};
use odbc_scanner_test::{environment, setup_if_needed, Function, MockDriver};
use std::sync::Arc;

fn driver(mock: &Arc<MockDriver>) -> Arc<dyn Driver> {
    setup_if_needed();
    Arc::clone(mock) as Arc<dyn Driver>
}

#[test]
fn it_allocates_and_pins_odbc3() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;

    assert!(env.is_allocated());
    assert_eq!(
        mock.functions(),
        vec![Function::AllocHandle, Function::SetEnvAttr]
    );
    let calls = mock.calls();
    assert_eq!(calls[1].handle, env.handle());
    assert!(calls[1].detail.as_deref().unwrap_or_default().contains("Odbc3"));

    Ok(())
}

#[test]
fn it_rejects_a_second_init() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let mut env = Environment::new(driver(&mock));
    env.init()?;

    let err = env.init().unwrap_err();
    assert!(matches!(
        err,
        Error::Sequence {
            operation: "Environment::init",
            ..
        }
    ));
    assert_eq!(mock.count(Function::AllocHandle), 1);

    env.close()?;
    assert_eq!(mock.live_handles(), 0);

    Ok(())
}

#[test]
fn it_releases_the_handle_on_drop() -> anyhow::Result<()> {
    let mock = MockDriver::new();
    let env = environment(&mock)?;
    let handle = env.handle();

    drop(env);

    assert_eq!(mock.live_handles(), 0);
    let last = mock.calls().pop().unwrap();
    assert_eq!(last.function, Function::FreeHandle);
    assert_eq!(last.handle, handle);

    Ok(())
}

#[test]
fn it_reports_allocation_failures() {
    let mock = MockDriver::new();
    mock.fail_on(Function::AllocHandle, "HY001", 0, "memory allocation error");

    let err = Environment::open(driver(&mock)).unwrap_err();
    let driver_err = err.as_driver_error().expect("driver error");

    assert_eq!(driver_err.operation, "Environment::init SQLAllocHandle");
    assert_eq!(driver_err.code, SqlReturn::ERROR);
    // a null parent handle carries no diagnostics
    assert!(driver_err.records.is_empty());
    assert!(err.to_string().contains("(no diagnostics)"));
}

#[test]
fn it_frees_the_handle_when_the_version_cannot_be_set() {
    let mock = MockDriver::new();
    mock.fail_on(Function::SetEnvAttr, "HY024", 0, "invalid attribute value");

    let err = Environment::open(driver(&mock)).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Environment::init SQLSetEnvAttr: State: HY024, Native error: 0, Message: invalid attribute value"
    );
    assert_eq!(err.as_driver_error().and_then(|e| e.state()), Some("HY024"));
    assert_eq!(mock.count(Function::FreeHandle), 1);
    assert_eq!(mock.live_handles(), 0);
}
