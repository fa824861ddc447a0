//! Types for working with errors produced by odbc-scanner.

use crate::driver::{Driver, HandleType, RawHandle, SqlReturn};
use crate::type_info::SqlType;
use std::fmt::{self, Display, Formatter};

/// A specialized `Result` type for odbc-scanner.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Upper bound on the number of diagnostic records read after a failed call.
const MAX_DIAGNOSTIC_RECORDS: i16 = 16;

/// Represents all the ways a method can fail within odbc-scanner.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An operation was invoked in the wrong lifecycle state.
    #[error("{operation} {message}")]
    Sequence {
        operation: &'static str,
        message: &'static str,
    },

    /// A native driver call did not succeed.
    #[error(transparent)]
    Driver(#[from] Box<DriverError>),

    /// A described column has an SQL type with no C representation.
    #[error("unknown sql_data_type={}", .sql_type.0)]
    UnsupportedType { sql_type: SqlType },

    /// A second logical transaction tried to take the in-memory connection.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),

    /// A catalog operation the attachment does not support.
    #[error("binder error: {0}")]
    Binder(String),

    /// A bound buffer held bytes that could not be decoded.
    #[error("error decoding column {column}: {message}")]
    Decode { column: usize, message: String },

    /// Options were invalid.
    #[error("error with configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn sequence(operation: &'static str, message: &'static str) -> Self {
        Error::Sequence { operation, message }
    }

    /// Returns the driver error if this failure came from a native call.
    pub fn as_driver_error(&self) -> Option<&DriverError> {
        match self {
            Error::Driver(err) => Some(err),
            _ => None,
        }
    }
}

/// One diagnostic record attached to a failed native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Five character SQLSTATE.
    pub state: String,
    pub native_error: i32,
    pub message: String,
}

impl Display for DiagnosticRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State: {}, Native error: {}, Message: {}",
            self.state, self.native_error, self.message
        )
    }
}

/// A native call that returned something other than success, together with
/// the handle it was issued on and every diagnostic record the driver had.
#[derive(Debug, Clone)]
pub struct DriverError {
    pub operation: &'static str,
    pub handle_type: HandleType,
    pub handle: RawHandle,
    pub code: SqlReturn,
    pub records: Vec<DiagnosticRecord>,
}

impl DriverError {
    pub(crate) fn collect(
        driver: &dyn Driver,
        operation: &'static str,
        handle_type: HandleType,
        handle: RawHandle,
        code: SqlReturn,
    ) -> Self {
        DriverError {
            operation,
            handle_type,
            handle,
            code,
            records: diagnostic_records(driver, handle_type, handle),
        }
    }

    /// The first record's SQLSTATE, if the driver supplied one.
    pub fn state(&self) -> Option<&str> {
        self.records.first().map(|r| r.state.as_str())
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.operation)?;

        if self.records.is_empty() {
            return write!(
                f,
                "{} on {} {} (no diagnostics)",
                self.code, self.handle_type, self.handle
            );
        }

        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            Display::fmt(record, f)?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}

impl From<DriverError> for Error {
    fn from(value: DriverError) -> Self {
        Error::Driver(Box::new(value))
    }
}

pub(crate) fn diagnostic_records(
    driver: &dyn Driver,
    handle_type: HandleType,
    handle: RawHandle,
) -> Vec<DiagnosticRecord> {
    if handle.is_null() {
        return Vec::new();
    }

    (1..=MAX_DIAGNOSTIC_RECORDS)
        .map_while(|number| driver.diagnostic_record(handle_type, handle, number))
        .collect()
}
