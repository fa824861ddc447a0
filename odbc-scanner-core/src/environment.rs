use crate::driver::{Driver, EnvironmentAttribute, HandleType, OdbcVersion, RawHandle};
use crate::error::{Error, Result};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// The driver-manager session.
///
/// Created once by the host and shared with every [`Connection`] through an
/// `Arc`, so the handle is only released after the last connection built from
/// it is gone.
///
/// [`Connection`]: crate::Connection
pub struct Environment {
    driver: Arc<dyn Driver>,
    handle: RawHandle,
}

impl Environment {
    /// An unallocated environment. Call [`Environment::init`] before use.
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Environment {
            driver,
            handle: RawHandle::NULL,
        }
    }

    /// Allocates and initializes an environment pinned to ODBC 3.
    pub fn open(driver: Arc<dyn Driver>) -> Result<Arc<Self>> {
        let mut env = Environment::new(driver);
        env.init()?;
        Ok(Arc::new(env))
    }

    pub fn init(&mut self) -> Result<()> {
        if !self.handle.is_null() {
            return Err(Error::sequence(
                "Environment::init",
                "handle is already allocated",
            ));
        }

        self.handle = self
            .driver
            .alloc_handle(HandleType::Env, RawHandle::NULL)
            .into_result(
                &*self.driver,
                "Environment::init SQLAllocHandle",
                HandleType::Env,
                RawHandle::NULL,
            )?;

        let version = self
            .driver
            .set_env_attr(
                self.handle,
                EnvironmentAttribute::OdbcVersion(OdbcVersion::Odbc3),
            )
            .into_result(
                &*self.driver,
                "Environment::init SQLSetEnvAttr",
                HandleType::Env,
                self.handle,
            );

        if let Err(e) = version {
            // an environment without a version cannot allocate connections
            if let Err(free) = self.free_handle() {
                log::error!("failed to release environment after init failure: {}", free);
            }
            return Err(e);
        }

        log::debug!("allocated ODBC environment {}", self.handle);
        Ok(())
    }

    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    pub fn is_allocated(&self) -> bool {
        !self.handle.is_null()
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Releases the handle, reporting a failure instead of logging it.
    pub fn close(mut self) -> Result<()> {
        self.free_handle()
    }

    fn free_handle(&mut self) -> Result<()> {
        if self.handle.is_null() {
            return Ok(());
        }

        let handle = std::mem::replace(&mut self.handle, RawHandle::NULL);
        self.driver
            .free_handle(HandleType::Env, handle)
            .into_result(
                &*self.driver,
                "Environment::free_handle SQLFreeHandle",
                HandleType::Env,
                handle,
            )
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if let Err(e) = self.free_handle() {
            log::error!("failed to release ODBC environment: {}", e);
        }
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("handle", &self.handle)
            .finish()
    }
}
