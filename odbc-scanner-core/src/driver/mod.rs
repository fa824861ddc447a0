//! The seam between this crate and an ODBC driver manager.
//!
//! [`Driver`] mirrors the subset of the driver-manager API the scanner needs.
//! Handles are opaque integers so that environments and connections can be
//! shared across threads; only the driver ever turns them back into pointers.
//!
//! With the `odbc` feature enabled, [`native::NativeDriver`] forwards every
//! call to the system driver manager.

use crate::column::Nullability;
use crate::error::{diagnostic_records, DiagnosticRecord, DriverError, Error};
use crate::type_info::{CType, SqlType};
use std::fmt::{self, Debug, Display, Formatter};

#[cfg(feature = "odbc")]
pub mod native;

/// An opaque driver-manager handle. `0` is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawHandle(pub usize);

impl RawHandle {
    pub const NULL: RawHandle = RawHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Display for RawHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleType {
    Env,
    Dbc,
    Stmt,
}

impl Display for HandleType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandleType::Env => "SQL_HANDLE_ENV",
            HandleType::Dbc => "SQL_HANDLE_DBC",
            HandleType::Stmt => "SQL_HANDLE_STMT",
        })
    }
}

/// Raw `SQLRETURN` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlReturn(pub i16);

impl SqlReturn {
    pub const SUCCESS: SqlReturn = SqlReturn(0);
    pub const SUCCESS_WITH_INFO: SqlReturn = SqlReturn(1);
    pub const NO_DATA: SqlReturn = SqlReturn(100);
    pub const ERROR: SqlReturn = SqlReturn(-1);
    pub const INVALID_HANDLE: SqlReturn = SqlReturn(-2);
}

impl Display for SqlReturn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            SqlReturn::SUCCESS => f.write_str("SQL_SUCCESS"),
            SqlReturn::SUCCESS_WITH_INFO => f.write_str("SQL_SUCCESS_WITH_INFO"),
            SqlReturn::NO_DATA => f.write_str("SQL_NO_DATA"),
            SqlReturn::ERROR => f.write_str("SQL_ERROR"),
            SqlReturn::INVALID_HANDLE => f.write_str("SQL_INVALID_HANDLE"),
            SqlReturn(other) => write!(f, "SQLRETURN({})", other),
        }
    }
}

/// Outcome of a native call.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlResult<T> {
    Success(T),
    SuccessWithInfo(T),
    NoData,
    Error(SqlReturn),
}

impl<T> SqlResult<T> {
    /// Classifies a raw return code, attaching `value` on success.
    pub fn from_return(code: SqlReturn, value: T) -> Self {
        match code {
            SqlReturn::SUCCESS => SqlResult::Success(value),
            SqlReturn::SUCCESS_WITH_INFO => SqlResult::SuccessWithInfo(value),
            SqlReturn::NO_DATA => SqlResult::NoData,
            other => SqlResult::Error(other),
        }
    }

    pub fn code(&self) -> SqlReturn {
        match self {
            SqlResult::Success(_) => SqlReturn::SUCCESS,
            SqlResult::SuccessWithInfo(_) => SqlReturn::SUCCESS_WITH_INFO,
            SqlResult::NoData => SqlReturn::NO_DATA,
            SqlResult::Error(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SqlResult::Success(_) | SqlResult::SuccessWithInfo(_))
    }

    /// Success and success-with-info yield the value; anything else becomes a
    /// [`DriverError`] carrying the diagnostics of `handle`.
    pub(crate) fn into_result(
        self,
        driver: &dyn Driver,
        operation: &'static str,
        handle_type: HandleType,
        handle: RawHandle,
    ) -> Result<T, Error> {
        match self {
            SqlResult::Success(v) => Ok(v),
            SqlResult::SuccessWithInfo(v) => {
                log_info(driver, operation, handle_type, handle);
                Ok(v)
            }
            other => {
                let code = other.code();
                Err(DriverError::collect(driver, operation, handle_type, handle, code).into())
            }
        }
    }
}

fn log_info(
    driver: &dyn Driver,
    operation: &'static str,
    handle_type: HandleType,
    handle: RawHandle,
) {
    if !log::log_enabled!(log::Level::Warn) {
        return;
    }
    for record in diagnostic_records(driver, handle_type, handle) {
        log::warn!("{} returned SQL_SUCCESS_WITH_INFO: {}", operation, record);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdbcVersion {
    Odbc3,
}

impl OdbcVersion {
    /// The `SQL_OV_*` value.
    pub fn code(self) -> usize {
        match self {
            OdbcVersion::Odbc3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentAttribute {
    OdbcVersion(OdbcVersion),
}

/// Statement attributes the scanner sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementAttribute {
    /// `SQL_ATTR_ROW_BIND_TYPE = SQL_BIND_BY_COLUMN`.
    RowBindByColumn,
    /// `SQL_ATTR_ROW_ARRAY_SIZE`.
    RowArraySize(usize),
    /// `SQL_ATTR_ROWS_FETCHED_PTR`.
    RowsFetchedPtr(*mut usize),
}

impl StatementAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            StatementAttribute::RowBindByColumn => "SQL_ATTR_ROW_BIND_TYPE",
            StatementAttribute::RowArraySize(_) => "SQL_ATTR_ROW_ARRAY_SIZE",
            StatementAttribute::RowsFetchedPtr(_) => "SQL_ATTR_ROWS_FETCHED_PTR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrientation {
    Next,
}

/// What `SQLDescribeCol` reports for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedColumn {
    pub name: String,
    pub data_type: SqlType,
    pub column_size: usize,
    pub decimal_digits: i16,
    pub nullability: Nullability,
}

/// A driver-manager API.
///
/// Implementations must be usable from any thread; the scanner itself never
/// issues concurrent calls on the same handle.
pub trait Driver: Send + Sync + Debug {
    /// `SQLAllocHandle`. `parent` is [`RawHandle::NULL`] for environments.
    fn alloc_handle(&self, handle_type: HandleType, parent: RawHandle) -> SqlResult<RawHandle>;

    /// `SQLFreeHandle`.
    fn free_handle(&self, handle_type: HandleType, handle: RawHandle) -> SqlResult<()>;

    /// `SQLSetEnvAttr`.
    fn set_env_attr(&self, env: RawHandle, attribute: EnvironmentAttribute) -> SqlResult<()>;

    /// `SQLDriverConnect` with `SQL_DRIVER_NOPROMPT`. Returns the completed
    /// connection string, truncated to `max_out_len` bytes.
    fn driver_connect(
        &self,
        dbc: RawHandle,
        connection_string: &str,
        max_out_len: usize,
    ) -> SqlResult<String>;

    /// `SQLDisconnect`.
    fn disconnect(&self, dbc: RawHandle) -> SqlResult<()>;

    /// `SQLPrepare`.
    fn prepare(&self, stmt: RawHandle, sql: &str) -> SqlResult<()>;

    /// `SQLSetStmtAttr`.
    ///
    /// # Safety
    ///
    /// A pointer passed through `attribute` must stay valid for as long as the
    /// driver may write through it.
    unsafe fn set_stmt_attr(&self, stmt: RawHandle, attribute: StatementAttribute)
        -> SqlResult<()>;

    /// `SQLBindCol`.
    ///
    /// # Safety
    ///
    /// `buffer` must point to `row_array_size * buffer_len` writable bytes and
    /// `indicator` to `row_array_size` writable lengths for every fetch issued
    /// while the binding is in place.
    unsafe fn bind_col(
        &self,
        stmt: RawHandle,
        column: u16,
        c_type: CType,
        buffer: *mut u8,
        buffer_len: isize,
        indicator: *mut isize,
    ) -> SqlResult<()>;

    /// `SQLNumResultCols`.
    fn num_result_cols(&self, stmt: RawHandle) -> SqlResult<i16>;

    /// `SQLDescribeCol`. `column` is 1-based.
    fn describe_col(&self, stmt: RawHandle, column: u16) -> SqlResult<DescribedColumn>;

    /// `SQLExecute`.
    ///
    /// # Safety
    ///
    /// Bound columns must satisfy the contract of [`Driver::bind_col`].
    unsafe fn execute(&self, stmt: RawHandle) -> SqlResult<()>;

    /// `SQLFetchScroll`.
    ///
    /// # Safety
    ///
    /// Bound columns and the rows-fetched pointer must be valid.
    unsafe fn fetch_scroll(
        &self,
        stmt: RawHandle,
        orientation: FetchOrientation,
        offset: isize,
    ) -> SqlResult<()>;

    /// `SQLGetDiagRec`. `record` is 1-based; `None` once records run out.
    fn diagnostic_record(
        &self,
        handle_type: HandleType,
        handle: RawHandle,
        record: i16,
    ) -> Option<DiagnosticRecord>;
}
