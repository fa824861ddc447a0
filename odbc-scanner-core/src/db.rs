use crate::connection::Connection;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::scan::OdbcScan;
use crate::statement::{Statement, StatementOptions};
use std::sync::Arc;

/// A dialed connection plus the queries the catalog and the write
/// operators run against it.
#[derive(Debug)]
pub struct OdbcDb {
    conn: Arc<Connection>,
}

impl OdbcDb {
    pub fn open(env: &Arc<Environment>, connection_string: &str) -> Result<Self> {
        let conn = Connection::open(env, connection_string)?;
        Ok(OdbcDb::from(conn))
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    /// An allocated statement with `sql` prepared on it.
    ///
    /// The statement borrows this database and cannot outlive it.
    pub fn statement(&self, sql: &str) -> Result<Statement<'_>> {
        let mut stmt = Statement::new(&self.conn);
        stmt.init()?;
        stmt.prepare(sql)?;
        Ok(stmt)
    }

    pub fn query(&self, sql: &str, options: StatementOptions) -> Result<OdbcScan<'_>> {
        OdbcScan::new(self, sql, options)
    }

    /// Runs `PRAGMA <name>` and reads the first column of the first row as an
    /// integer.
    pub fn run_pragma(&self, name: &str) -> Result<i64> {
        let mut scan = self.query(&format!("PRAGMA {}", name), StatementOptions::new(1))?;

        let chunk = scan
            .next_chunk()?
            .ok_or_else(|| Error::Internal(format!("PRAGMA {} returned no rows", name)))?;

        let value = chunk
            .value(0, 0)
            .ok_or_else(|| Error::Internal(format!("PRAGMA {} returned no columns", name)))?;

        value.as_i64().ok_or_else(|| {
            Error::Internal(format!(
                "PRAGMA {} returned a non-integer value: {}",
                name, value
            ))
        })
    }

    /// Passes a DELETE or UPDATE statement through to the data source.
    ///
    /// The statement is executed once and no rows are fetched.
    pub fn execute(&self, sql: &str) -> Result<()> {
        let mut stmt = self.statement(sql)?;
        stmt.execute(&StatementOptions::new(1))?;
        stmt.close()
    }
}

impl From<Connection> for OdbcDb {
    fn from(conn: Connection) -> Self {
        OdbcDb {
            conn: Arc::new(conn),
        }
    }
}
