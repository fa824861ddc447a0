use crate::column::ColumnDescription;
use crate::connection::Connection;
use crate::driver::{
    Driver, FetchOrientation, HandleType, RawHandle, SqlResult, StatementAttribute,
};
use crate::error::{DriverError, Error, Result};
use crate::type_info::CType;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Per-execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOptions {
    /// Rows delivered into the bound buffers by one fetch.
    pub row_array_size: usize,
}

impl StatementOptions {
    /// # Panics
    /// Panics if `row_array_size` is 0.
    pub fn new(row_array_size: usize) -> Self {
        assert!(row_array_size > 0, "row_array_size must be greater than 0");
        StatementOptions { row_array_size }
    }
}

/// One SQL execution unit and its forward-only block cursor.
///
/// The lifecycle is `init` → `prepare` → `describe_columns` / `bind_column` →
/// `execute` → `fetch`*. A statement prepares exactly one SQL text; create a
/// new statement to run different SQL.
///
/// A statement borrows its connection, so the connection (and whatever holds
/// it) outlives every cursor opened on it.
pub struct Statement<'c> {
    conn: &'c Connection,
    handle: RawHandle,
    prepared: bool,
    executing: bool,
    columns: Option<Vec<ColumnDescription>>,
    // the driver writes here during fetch, so it must not move
    rows_fetched: Box<usize>,
}

impl<'c> Statement<'c> {
    /// An unallocated statement on `conn`. Call [`Statement::init`] before use.
    pub fn new(conn: &'c Connection) -> Self {
        Statement {
            conn,
            handle: RawHandle::NULL,
            prepared: false,
            executing: false,
            columns: None,
            rows_fetched: Box::new(0),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        if !self.handle.is_null() {
            return Err(Error::sequence(
                "Statement::init",
                "handle has already been initialized. To execute a different statement instantiate a new statement",
            ));
        }
        if !self.conn.is_allocated() {
            return Err(Error::sequence(
                "Statement::init",
                "connection handle has not been allocated",
            ));
        }

        let driver = self.driver();
        self.handle = driver
            .alloc_handle(HandleType::Stmt, self.conn.handle())
            .into_result(
                &*driver,
                "Statement::init SQLAllocHandle",
                HandleType::Dbc,
                self.conn.handle(),
            )?;
        Ok(())
    }

    pub fn prepare(&mut self, sql: &str) -> Result<()> {
        if self.handle.is_null() {
            return Err(Error::sequence(
                "Statement::prepare",
                "handle has not been allocated. Call Statement::init() before Statement::prepare()",
            ));
        }
        if self.prepared {
            return Err(Error::sequence(
                "Statement::prepare",
                "statement is already prepared. To execute a different statement instantiate a new statement",
            ));
        }

        log::debug!("preparing on {}: {}", self.handle, sql);
        let driver = self.driver();
        driver.prepare(self.handle, sql).into_result(
            &*driver,
            "Statement::prepare SQLPrepare",
            HandleType::Stmt,
            self.handle,
        )?;

        self.prepared = true;
        Ok(())
    }

    /// `SQLSetStmtAttr`.
    ///
    /// # Safety
    ///
    /// A pointer passed through `attribute` must stay valid for every call
    /// during which the driver may write through it.
    pub unsafe fn set_attribute(&mut self, attribute: StatementAttribute) -> Result<()> {
        if self.handle.is_null() {
            return Err(Error::sequence(
                "Statement::set_attribute",
                "handle has not been allocated. Call Statement::init() before Statement::set_attribute()",
            ));
        }

        let driver = self.driver();
        driver.set_stmt_attr(self.handle, attribute).into_result(
            &*driver,
            "Statement::set_attribute SQLSetStmtAttr",
            HandleType::Stmt,
            self.handle,
        )
    }

    /// Binds a caller-owned buffer to the 1-based column `ordinal`.
    ///
    /// The statement records the pointers and does not own the memory.
    ///
    /// # Safety
    ///
    /// For every `execute` and `fetch` issued while the binding is in place,
    /// `buffer` must point to `row_array_size * buffer_len` writable bytes and
    /// `indicator` to `row_array_size` writable values. Neither may move or be
    /// freed before the statement is dropped.
    pub unsafe fn bind_column(
        &mut self,
        ordinal: u16,
        c_type: CType,
        buffer: *mut u8,
        buffer_len: usize,
        indicator: *mut isize,
    ) -> Result<()> {
        if self.handle.is_null() {
            return Err(Error::sequence(
                "Statement::bind_column",
                "handle has not been allocated. Call Statement::init() before Statement::bind_column()",
            ));
        }

        let driver = self.driver();
        driver
            .bind_col(
                self.handle,
                ordinal,
                c_type,
                buffer,
                buffer_len as isize,
                indicator,
            )
            .into_result(
                &*driver,
                "Statement::bind_column SQLBindCol",
                HandleType::Stmt,
                self.handle,
            )
    }

    pub fn num_result_cols(&self) -> Result<i16> {
        if self.handle.is_null() {
            return Err(Error::sequence(
                "Statement::num_result_cols",
                "handle has not been allocated. Call Statement::init() before Statement::prepare()",
            ));
        }
        if !self.prepared {
            return Err(Error::sequence(
                "Statement::num_result_cols",
                "statement has not been prepared. Call Statement::prepare() before Statement::num_result_cols()",
            ));
        }

        let driver = self.driver();
        driver.num_result_cols(self.handle).into_result(
            &*driver,
            "Statement::num_result_cols SQLNumResultCols",
            HandleType::Stmt,
            self.handle,
        )
    }

    /// Describes every result column and resolves its bound representation.
    ///
    /// Computed on the first call; later calls return the same descriptions.
    pub fn describe_columns(&mut self) -> Result<&[ColumnDescription]> {
        if self.columns.is_none() {
            let count = self.num_result_cols()?.max(0) as u16;
            let driver = self.driver();

            let mut columns = Vec::with_capacity(usize::from(count));
            for column in 1..=count {
                let described = driver.describe_col(self.handle, column).into_result(
                    &*driver,
                    "Statement::describe_columns SQLDescribeCol",
                    HandleType::Stmt,
                    self.handle,
                )?;
                columns.push(ColumnDescription::resolve(
                    usize::from(column - 1),
                    described,
                )?);
            }

            self.columns = Some(columns);
        }

        Ok(self.columns.as_deref().unwrap_or_default())
    }

    pub fn execute(&mut self, options: &StatementOptions) -> Result<()> {
        if self.handle.is_null() {
            return Err(Error::sequence("Statement::execute", "handle is null"));
        }
        if !self.prepared {
            return Err(Error::sequence(
                "Statement::execute",
                "statement is not prepared",
            ));
        }
        if self.executing {
            return Err(Error::sequence(
                "Statement::execute",
                "previous statement is executing",
            ));
        }

        // neither attribute carries a pointer
        unsafe {
            self.set_attribute(StatementAttribute::RowBindByColumn)?;
            self.set_attribute(StatementAttribute::RowArraySize(options.row_array_size))?;
        }

        log::debug!(
            "executing {} with row array size {}",
            self.handle,
            options.row_array_size
        );
        let driver = self.driver();
        // bound buffers are the caller's responsibility, see `bind_column`
        unsafe { driver.execute(self.handle) }.into_result(
            &*driver,
            "Statement::execute SQLExecute",
            HandleType::Stmt,
            self.handle,
        )?;

        self.executing = true;
        Ok(())
    }

    /// Advances the cursor by one block and returns the number of rows the
    /// driver delivered into the bound buffers.
    ///
    /// When the result set is exhausted this returns `0` and the statement
    /// stays executing.
    pub fn fetch(&mut self) -> Result<usize> {
        if self.handle.is_null() {
            return Err(Error::sequence("Statement::fetch", "handle is null"));
        }
        if !self.prepared {
            return Err(Error::sequence(
                "Statement::fetch",
                "statement is not prepared",
            ));
        }
        if !self.executing {
            return Err(Error::sequence(
                "Statement::fetch",
                "statement is not executing",
            ));
        }

        *self.rows_fetched = 0;
        let rows_fetched: *mut usize = &mut *self.rows_fetched;
        // `rows_fetched` is boxed and lives as long as the handle
        unsafe { self.set_attribute(StatementAttribute::RowsFetchedPtr(rows_fetched))? };

        let driver = self.driver();
        match unsafe { driver.fetch_scroll(self.handle, FetchOrientation::Next, 0) } {
            SqlResult::Success(()) | SqlResult::SuccessWithInfo(()) => {}
            SqlResult::NoData => {
                log::trace!("fetch on {}: no more data", self.handle);
                return Ok(0);
            }
            SqlResult::Error(code) => {
                return Err(DriverError::collect(
                    &*driver,
                    "Statement::fetch SQLFetchScroll",
                    HandleType::Stmt,
                    self.handle,
                    code,
                )
                .into());
            }
        }

        let delivered = *self.rows_fetched;
        log::trace!("fetch on {}: {} rows", self.handle, delivered);
        Ok(delivered)
    }

    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Releases the handle, reporting a failure instead of logging it.
    pub fn close(mut self) -> Result<()> {
        self.free_handle()
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(self.conn.driver())
    }

    fn free_handle(&mut self) -> Result<()> {
        self.prepared = false;
        self.executing = false;

        if self.handle.is_null() {
            return Ok(());
        }

        let handle = std::mem::replace(&mut self.handle, RawHandle::NULL);
        let driver = self.driver();
        driver.free_handle(HandleType::Stmt, handle).into_result(
            &*driver,
            "Statement::free_handle SQLFreeHandle",
            HandleType::Stmt,
            handle,
        )
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.free_handle() {
            log::error!("failed to release ODBC statement: {}", e);
        }
    }
}

impl Debug for Statement<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("handle", &self.handle)
            .field("prepared", &self.prepared)
            .field("executing", &self.executing)
            .finish()
    }
}
