mod mock;

pub use mock::{Call, Function, MockColumn, MockDriver, MockResult, MockValue};

use odbc_scanner_core::{Driver, Environment, OdbcDb};
use std::sync::Arc;

pub fn setup_if_needed() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Opens an environment backed by `driver`.
pub fn environment(driver: &Arc<MockDriver>) -> odbc_scanner_core::Result<Arc<Environment>> {
    setup_if_needed();
    let driver: Arc<dyn Driver> = Arc::clone(driver) as Arc<dyn Driver>;
    Environment::open(driver)
}

/// Opens an environment and a database connection backed by `driver`.
pub fn new_db(driver: &Arc<MockDriver>) -> odbc_scanner_core::Result<OdbcDb> {
    let env = environment(driver)?;
    OdbcDb::open(&env, "Driver=Mock;Database=test")
}
