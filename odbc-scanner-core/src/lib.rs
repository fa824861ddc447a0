//! Core of odbc-scanner.
//! Not intended to be used directly.
//!
//! Drives the ODBC handle lifecycle (environment, connection, statement), maps
//! driver SQL types onto fixed-width column buffers, and guards the single
//! connection behind an in-memory attachment.
#![warn(future_incompatible, rust_2018_idioms)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::module_inception
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod catalog;
pub mod column;
pub mod connection;
pub mod db;
pub mod driver;
pub mod environment;
pub mod error;
pub mod options;
pub mod scan;
pub mod statement;
pub mod transaction;
pub mod type_info;
pub mod value;

pub use catalog::{
    AccessMode, DatabaseSize, InMemoryDatabase, OdbcCatalog, OdbcSchemaEntry, OnEntryNotFound,
};
pub use column::{ColumnDescription, Nullability};
pub use connection::{Connection, MAX_CONN_STR_OUT};
pub use db::OdbcDb;
pub use driver::{Driver, HandleType, RawHandle, SqlResult, SqlReturn};
pub use environment::Environment;
pub use error::{DiagnosticRecord, DriverError, Error, Result};
pub use options::OdbcScanOptions;
pub use scan::{DataChunk, OdbcScan};
pub use statement::{Statement, StatementOptions};
pub use transaction::OdbcTransaction;
pub use type_info::{map_type, CType, SqlType};
pub use value::Value;

#[cfg(feature = "odbc")]
#[cfg_attr(docsrs, doc(cfg(feature = "odbc")))]
pub use driver::native::NativeDriver;
