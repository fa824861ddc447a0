use crate::catalog::{AccessMode, InMemoryDatabase, OdbcCatalog};
use crate::db::OdbcDb;
use crate::error::{Error, Result};

#[derive(Debug)]
enum TransactionDb<'c> {
    InMemory(InMemoryDatabase<'c>),
    Remote(OdbcDb),
}

/// One logical transaction on an attachment.
///
/// On an in-memory attachment the transaction holds the shared connection
/// until it is committed, rolled back or dropped. Commit and rollback only
/// release the connection; nothing is sent to the data source.
///
/// Scans borrow the transaction's database, so the transaction cannot end
/// while one of them is open:
///
/// ```compile_fail
/// use odbc_scanner_core::{OdbcCatalog, OdbcTransaction, Result, StatementOptions};
///
/// fn scan_past_commit(catalog: &OdbcCatalog) -> Result<()> {
///     let tx = OdbcTransaction::start(catalog)?;
///     let mut scan = tx.db().query("SELECT 1", StatementOptions::new(1))?;
///     tx.commit()?;
///     scan.next_chunk()?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct OdbcTransaction<'c> {
    catalog: &'c OdbcCatalog,
    db: TransactionDb<'c>,
}

impl<'c> OdbcTransaction<'c> {
    pub fn start(catalog: &'c OdbcCatalog) -> Result<Self> {
        let db = if catalog.in_memory() {
            TransactionDb::InMemory(catalog.get_in_memory_database()?)
        } else {
            TransactionDb::Remote(catalog.open_database()?)
        };

        let tx = OdbcTransaction { catalog, db };
        log::debug!("started transaction on {:?}", tx.db().connection());
        Ok(tx)
    }

    pub fn db(&self) -> &OdbcDb {
        match &self.db {
            TransactionDb::InMemory(db) => &**db,
            TransactionDb::Remote(db) => db,
        }
    }

    pub fn catalog(&self) -> &'c OdbcCatalog {
        self.catalog
    }

    /// Passes a write statement through. Refused on read-only attachments.
    pub fn execute(&self, sql: &str) -> Result<()> {
        if self.catalog.access_mode() == AccessMode::ReadOnly {
            return Err(Error::Transaction(
                "cannot execute a write statement on a read-only Odbc database".into(),
            ));
        }
        self.db().execute(sql)
    }

    pub fn commit(self) -> Result<()> {
        self.release()
    }

    pub fn rollback(self) -> Result<()> {
        self.release()
    }

    // dropping the transaction instead releases through the guard's `Drop`
    fn release(self) -> Result<()> {
        match self.db {
            TransactionDb::InMemory(db) => self.catalog.release_in_memory_database(db),
            TransactionDb::Remote(_) => Ok(()),
        }
    }
}
