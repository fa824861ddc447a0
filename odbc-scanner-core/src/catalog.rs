use crate::db::OdbcDb;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::options::OdbcScanOptions;
use crate::transaction::OdbcTransaction;
use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

/// Name of the only schema an attachment exposes.
pub const DEFAULT_SCHEMA: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// What a lookup does when the entry does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnEntryNotFound {
    ThrowException,
    ReturnNull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdbcSchemaEntry {
    name: String,
}

impl OdbcSchemaEntry {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Storage figures reported for an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseSize {
    pub total_blocks: u64,
    pub block_size: u64,
    pub free_blocks: u64,
    pub used_blocks: u64,
    pub bytes: u64,
    /// `None` when the data source does not report it.
    pub wal_size: Option<u64>,
}

/// An attached ODBC data source.
///
/// A `:memory:` attachment owns a single connection that is handed to one
/// transaction at a time; any other attachment opens a connection per
/// transaction.
pub struct OdbcCatalog {
    env: Arc<Environment>,
    options: OdbcScanOptions,
    access_mode: AccessMode,
    main_schema: OdbcSchemaEntry,
    in_memory_db: Option<OdbcDb>,
    active_in_memory: Mutex<bool>,
}

impl OdbcCatalog {
    pub fn attach(
        env: &Arc<Environment>,
        options: OdbcScanOptions,
        access_mode: AccessMode,
    ) -> Result<Self> {
        let in_memory_db = if options.is_in_memory() {
            log::debug!("attaching in-memory ODBC database");
            Some(OdbcDb::open(env, options.dial_string())?)
        } else {
            None
        };

        Ok(OdbcCatalog {
            env: Arc::clone(env),
            options,
            access_mode,
            main_schema: OdbcSchemaEntry {
                name: DEFAULT_SCHEMA.to_string(),
            },
            in_memory_db,
            active_in_memory: Mutex::new(false),
        })
    }

    pub fn in_memory(&self) -> bool {
        self.in_memory_db.is_some()
    }

    /// The attach path: `:memory:` or the connection string.
    pub fn path(&self) -> &str {
        self.options.connection_string()
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn options(&self) -> &OdbcScanOptions {
        &self.options
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Hands out the shared in-memory connection.
    ///
    /// Fails while another caller holds it. The returned guard borrows the
    /// catalog and releases the connection when it is dropped or passed to
    /// [`OdbcCatalog::release_in_memory_database`]; every statement opened on
    /// it must be gone by then.
    pub fn get_in_memory_database(&self) -> Result<InMemoryDatabase<'_>> {
        let db = self.in_memory_db.as_ref().ok_or_else(|| {
            Error::Internal(
                "get_in_memory_database() called on a non-in-memory database".into(),
            )
        })?;

        let mut active = self.lock()?;
        if *active {
            return Err(Error::Transaction(
                "Only a single transaction can be active on an in-memory Odbc database at a time"
                    .into(),
            ));
        }
        *active = true;

        Ok(InMemoryDatabase {
            catalog: self,
            db,
            released: false,
        })
    }

    /// Gives back a connection taken with
    /// [`OdbcCatalog::get_in_memory_database`].
    pub fn release_in_memory_database(&self, db: InMemoryDatabase<'_>) -> Result<()> {
        if !self.in_memory() {
            return Ok(());
        }
        if !std::ptr::eq(db.catalog, self) {
            return Err(Error::Internal(
                "release_in_memory_database() called with a database of another catalog".into(),
            ));
        }
        db.release()
    }

    fn clear_active(&self) -> Result<()> {
        let mut active = self.lock()?;
        if !*active {
            return Err(Error::Internal(
                "release_in_memory_database() called but there is no active transaction on an in-memory database"
                    .into(),
            ));
        }
        *active = false;

        Ok(())
    }

    /// Opens a fresh connection for a transaction on a non-in-memory attachment.
    pub(crate) fn open_database(&self) -> Result<OdbcDb> {
        OdbcDb::open(&self.env, self.options.dial_string())
    }

    /// Looks up a schema. `main` and the empty name resolve to the single
    /// schema.
    pub fn get_schema(
        &self,
        name: &str,
        if_not_found: OnEntryNotFound,
    ) -> Result<Option<&OdbcSchemaEntry>> {
        if name == DEFAULT_SCHEMA || name.is_empty() {
            return Ok(Some(&self.main_schema));
        }

        match if_not_found {
            OnEntryNotFound::ReturnNull => Ok(None),
            OnEntryNotFound::ThrowException => Err(Error::Binder(format!(
                "Odbc databases only have a single schema - \"{}\"",
                DEFAULT_SCHEMA
            ))),
        }
    }

    pub fn scan_schemas(&self, mut callback: impl FnMut(&OdbcSchemaEntry)) {
        callback(&self.main_schema);
    }

    pub fn create_schema(&self, _name: &str) -> Result<()> {
        Err(Error::Binder(
            "Odbc databases do not support creating new schemas".into(),
        ))
    }

    pub fn drop_schema(&self, _name: &str) -> Result<()> {
        Err(Error::Binder(
            "Odbc databases do not support dropping schemas".into(),
        ))
    }

    /// Page statistics of the transaction's database.
    pub fn database_size(&self, transaction: &OdbcTransaction<'_>) -> Result<DatabaseSize> {
        let db = transaction.db();

        let total_blocks = pragma_u64(db, "page_count")?;
        let block_size = pragma_u64(db, "page_size")?;
        let free_blocks = pragma_u64(db, "freelist_count")?;

        Ok(DatabaseSize {
            total_blocks,
            block_size,
            free_blocks,
            used_blocks: total_blocks.saturating_sub(free_blocks),
            bytes: total_blocks.checked_mul(block_size).ok_or_else(|| {
                Error::Internal(format!(
                    "database size overflows: {} pages of {} bytes",
                    total_blocks, block_size
                ))
            })?,
            wal_size: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, bool>> {
        self.active_in_memory
            .lock()
            .map_err(|_| Error::Internal("in-memory database lock is poisoned".into()))
    }
}

fn pragma_u64(db: &OdbcDb, name: &str) -> Result<u64> {
    let value = db.run_pragma(name)?;
    u64::try_from(value)
        .map_err(|_| Error::Internal(format!("PRAGMA {} returned a negative value: {}", name, value)))
}

impl Debug for OdbcCatalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcCatalog")
            .field("options", &self.options)
            .field("access_mode", &self.access_mode)
            .field("in_memory", &self.in_memory())
            .finish()
    }
}

/// Exclusive hold on the connection of an in-memory attachment.
///
/// Dereferences to the shared [`OdbcDb`]. Scans opened through it borrow the
/// guard, so it cannot be released while one of them is alive.
pub struct InMemoryDatabase<'c> {
    catalog: &'c OdbcCatalog,
    db: &'c OdbcDb,
    released: bool,
}

impl InMemoryDatabase<'_> {
    /// Releases the connection, reporting a failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.catalog.clear_active()
    }
}

impl Deref for InMemoryDatabase<'_> {
    type Target = OdbcDb;

    fn deref(&self) -> &OdbcDb {
        self.db
    }
}

impl Drop for InMemoryDatabase<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.catalog.clear_active() {
            log::error!("failed to release in-memory ODBC database: {}", e);
        }
    }
}

impl Debug for InMemoryDatabase<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDatabase")
            .field("db", self.db)
            .field("released", &self.released)
            .finish()
    }
}
