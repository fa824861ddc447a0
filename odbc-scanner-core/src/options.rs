use crate::error::Error;
use crate::statement::StatementOptions;
use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;

/// Attach path selecting the shared in-memory connection.
pub const IN_MEMORY_PATH: &str = ":memory:";

const DEFAULT_ROW_ARRAY_SIZE: usize = 128;
const DEFAULT_IN_MEMORY_CONNECTION_STRING: &str = "Driver=SQLite3;Database=:memory:";

/// Options for attaching an ODBC data source.
///
/// Parsed from the attach path:
///
/// ```rust
/// use odbc_scanner_core::OdbcScanOptions;
///
/// let opts: OdbcScanOptions = "odbc:Driver=SQLite3;Database=test.db".parse()?;
/// assert_eq!(opts.connection_string(), "Driver=SQLite3;Database=test.db");
///
/// let opts: OdbcScanOptions = "warehouse".parse()?;
/// assert_eq!(opts.connection_string(), "DSN=warehouse");
/// # Ok::<(), odbc_scanner_core::Error>(())
/// ```
#[derive(Clone)]
pub struct OdbcScanOptions {
    pub(crate) conn_str: String,
    pub(crate) row_array_size: usize,
    pub(crate) in_memory_conn_str: String,
}

impl OdbcScanOptions {
    pub fn connection_string(&self) -> &str {
        &self.conn_str
    }

    /// Whether this attachment uses the shared in-memory connection.
    pub fn is_in_memory(&self) -> bool {
        self.conn_str == IN_MEMORY_PATH
    }

    /// Sets the number of rows fetched per block.
    ///
    /// Every column buffer holds this many elements, so memory grows with
    /// `row_array_size * sum(column lengths)`.
    ///
    /// # Panics
    /// Panics if `row_array_size` is 0.
    pub fn row_array_size(&mut self, row_array_size: usize) -> &mut Self {
        assert!(row_array_size > 0, "row_array_size must be greater than 0");
        self.row_array_size = row_array_size;
        self
    }

    pub fn row_array_size_ref(&self) -> usize {
        self.row_array_size
    }

    /// Sets the connection string dialed for a `:memory:` attachment.
    pub fn in_memory_connection_string(&mut self, connection_string: impl Into<String>) -> &mut Self {
        self.in_memory_conn_str = connection_string.into();
        self
    }

    pub fn in_memory_connection_string_ref(&self) -> &str {
        &self.in_memory_conn_str
    }

    /// The string to dial: the in-memory connection string for a `:memory:`
    /// attachment, the connection string otherwise.
    pub fn dial_string(&self) -> &str {
        if self.is_in_memory() {
            &self.in_memory_conn_str
        } else {
            &self.conn_str
        }
    }

    pub fn statement_options(&self) -> StatementOptions {
        StatementOptions::new(self.row_array_size)
    }
}

impl Debug for OdbcScanOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcScanOptions")
            .field("conn_str", &"<redacted>")
            .field("row_array_size", &self.row_array_size)
            .field("in_memory_conn_str", &"<redacted>")
            .finish()
    }
}

impl FromStr for OdbcScanOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accepted forms:
        // - "odbc:DSN=Name;..." -> strip scheme
        // - "odbc:Name" or "Name" -> interpret as DSN
        // - ":memory:" -> shared in-memory connection
        let mut t = s.trim();
        if let Some(rest) = t.strip_prefix("odbc:") {
            t = rest.trim();
        }
        if t.is_empty() {
            return Err(Error::Configuration(
                "connection string must not be empty".into(),
            ));
        }

        let conn_str = if t == IN_MEMORY_PATH || t.contains('=') {
            t.to_string()
        } else {
            format!("DSN={}", t)
        };

        Ok(Self {
            conn_str,
            row_array_size: DEFAULT_ROW_ARRAY_SIZE,
            in_memory_conn_str: DEFAULT_IN_MEMORY_CONNECTION_STRING.to_string(),
        })
    }
}
