use crate::driver::{Driver, HandleType, RawHandle};
use crate::environment::Environment;
use crate::error::{Error, Result};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Capacity of the buffer receiving the driver-completed connection string.
pub const MAX_CONN_STR_OUT: usize = 1024;

/// One physical link to a data source.
pub struct Connection {
    env: Arc<Environment>,
    handle: RawHandle,
    dialed: bool,
    completed_connection_string: Option<String>,
}

impl Connection {
    /// An unallocated connection. Call [`Connection::init`] and
    /// [`Connection::dial`] before use.
    pub fn new(env: Arc<Environment>) -> Self {
        Connection {
            env,
            handle: RawHandle::NULL,
            dialed: false,
            completed_connection_string: None,
        }
    }

    /// Allocates a connection on `env` and dials `connection_string`.
    pub fn open(env: &Arc<Environment>, connection_string: &str) -> Result<Self> {
        let mut conn = Connection::new(Arc::clone(env));
        conn.init()?;
        conn.dial(connection_string)?;
        Ok(conn)
    }

    pub fn init(&mut self) -> Result<()> {
        if !self.handle.is_null() {
            return Err(Error::sequence(
                "Connection::init",
                "connection handle is already allocated",
            ));
        }
        if !self.env.is_allocated() {
            return Err(Error::sequence(
                "Connection::init",
                "environment handle has not been allocated",
            ));
        }

        let driver = Arc::clone(self.driver());
        self.handle = driver
            .alloc_handle(HandleType::Dbc, self.env.handle())
            .into_result(
                &*driver,
                "Connection::init SQLAllocHandle",
                HandleType::Env,
                self.env.handle(),
            )?;
        Ok(())
    }

    /// Connects without prompting. Success with info counts as success.
    pub fn dial(&mut self, connection_string: &str) -> Result<()> {
        if self.handle.is_null() {
            return Err(Error::sequence(
                "Connection::dial",
                "handle has not been allocated. Call Connection::init() before Connection::dial()",
            ));
        }
        if self.dialed {
            return Err(Error::sequence(
                "Connection::dial",
                "connection is already dialed",
            ));
        }

        let driver = Arc::clone(self.driver());
        let completed = driver
            .driver_connect(self.handle, connection_string, MAX_CONN_STR_OUT)
            .into_result(
                &*driver,
                "Connection::dial SQLDriverConnect",
                HandleType::Dbc,
                self.handle,
            )?;

        log::debug!("connected ODBC connection {}", self.handle);
        self.completed_connection_string = Some(completed);
        self.dialed = true;
        Ok(())
    }

    /// Disconnects if dialed; does nothing otherwise.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.dialed {
            return Ok(());
        }

        let driver = Arc::clone(self.driver());
        driver.disconnect(self.handle).into_result(
            &*driver,
            "Connection::disconnect SQLDisconnect",
            HandleType::Dbc,
            self.handle,
        )?;

        log::debug!("disconnected ODBC connection {}", self.handle);
        self.dialed = false;
        Ok(())
    }

    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    pub fn is_allocated(&self) -> bool {
        !self.handle.is_null()
    }

    pub fn is_dialed(&self) -> bool {
        self.dialed
    }

    /// The connection string as completed by the driver, at most
    /// [`MAX_CONN_STR_OUT`] bytes.
    pub fn completed_connection_string(&self) -> Option<&str> {
        self.completed_connection_string.as_deref()
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        self.env.driver()
    }

    /// Disconnects and releases the handle, reporting the first failure.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        // disconnect must run before the free, and a failed disconnect must
        // not skip the free
        let disconnected = self.disconnect();
        self.dialed = false;

        let freed = self.free_handle();
        disconnected.and(freed)
    }

    fn free_handle(&mut self) -> Result<()> {
        if self.handle.is_null() {
            return Ok(());
        }

        let handle = std::mem::replace(&mut self.handle, RawHandle::NULL);
        let driver = Arc::clone(self.driver());
        driver.free_handle(HandleType::Dbc, handle).into_result(
            &*driver,
            "Connection::free_handle SQLFreeHandle",
            HandleType::Dbc,
            handle,
        )
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::error!("failed to close ODBC connection: {}", e);
        }
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("handle", &self.handle)
            .field("dialed", &self.dialed)
            .finish()
    }
}
