//! Attach ODBC data sources as catalogs and stream their results in blocks.
//!
//! ```rust,ignore
//! use odbc_scanner::{AccessMode, Environment, OdbcCatalog, OdbcTransaction};
//!
//! let env = Environment::open(driver)?;
//! let catalog = OdbcCatalog::attach(&env, "odbc:DSN=warehouse".parse()?, AccessMode::ReadOnly)?;
//! let tx = OdbcTransaction::start(&catalog)?;
//! let options = catalog.options().statement_options();
//! let mut scan = tx.db().query("SELECT id, name FROM t", options)?;
//! while let Some(chunk) = scan.next_chunk()? {
//!     println!("{} rows", chunk.len());
//! }
//! drop(scan);
//! tx.commit()?;
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use odbc_scanner_core::catalog::{
    AccessMode, DatabaseSize, InMemoryDatabase, OdbcCatalog, OdbcSchemaEntry, OnEntryNotFound,
    DEFAULT_SCHEMA,
};
pub use odbc_scanner_core::column::{ColumnDescription, Nullability};
pub use odbc_scanner_core::connection::{Connection, MAX_CONN_STR_OUT};
pub use odbc_scanner_core::db::OdbcDb;
pub use odbc_scanner_core::driver::{self, Driver, HandleType, RawHandle, SqlResult, SqlReturn};
pub use odbc_scanner_core::environment::Environment;
pub use odbc_scanner_core::error::{self, DiagnosticRecord, DriverError, Error, Result};
pub use odbc_scanner_core::options::{OdbcScanOptions, IN_MEMORY_PATH};
pub use odbc_scanner_core::scan::{DataChunk, OdbcScan};
pub use odbc_scanner_core::statement::{Statement, StatementOptions};
pub use odbc_scanner_core::transaction::OdbcTransaction;
pub use odbc_scanner_core::type_info::{map_type, CType, SqlType};
pub use odbc_scanner_core::value::{Value, NULL_DATA};

#[cfg(feature = "odbc")]
#[cfg_attr(docsrs, doc(cfg(feature = "odbc")))]
pub use odbc_scanner_core::NativeDriver;
