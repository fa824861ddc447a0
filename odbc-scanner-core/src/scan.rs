use crate::column::ColumnDescription;
use crate::db::OdbcDb;
use crate::error::Result;
use crate::statement::{Statement, StatementOptions};
use crate::type_info::CType;
use crate::value::Value;
use std::mem::size_of;

// SQL_DATE_STRUCT, SQL_TIME_STRUCT, SQL_TIMESTAMP_STRUCT
const DATE_STRUCT_LEN: usize = 6;
const TIME_STRUCT_LEN: usize = 6;
const TIMESTAMP_STRUCT_LEN: usize = 16;

/// A block of decoded rows, stored column by column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataChunk {
    columns: Vec<Vec<Value>>,
    len: usize,
}

impl DataChunk {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&[Value]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn value(&self, column: usize, row: usize) -> Option<&Value> {
        self.columns.get(column)?.get(row)
    }

    /// Clones out one row.
    pub fn row(&self, row: usize) -> Option<Vec<Value>> {
        if row >= self.len {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row].clone()).collect())
    }

    pub fn into_columns(self) -> Vec<Vec<Value>> {
        self.columns
    }
}

struct ColumnBuffer {
    c_type: CType,
    element_len: usize,
    data: Vec<u8>,
    indicators: Vec<isize>,
}

impl ColumnBuffer {
    fn new(column: &ColumnDescription, row_array_size: usize) -> Self {
        // a driver may report a display size smaller than the struct it fills
        let element_len = match column.c_type() {
            CType::TypeDate => column.length().max(DATE_STRUCT_LEN),
            CType::TypeTime => column.length().max(TIME_STRUCT_LEN),
            CType::TypeTimestamp => column.length().max(TIMESTAMP_STRUCT_LEN),
            _ => column.length().max(size_of::<u8>()),
        };

        ColumnBuffer {
            c_type: column.c_type(),
            element_len,
            data: vec![0; element_len * row_array_size],
            indicators: vec![0; row_array_size],
        }
    }

    fn decode(&self, ordinal: usize, rows: usize) -> Result<Vec<Value>> {
        self.data
            .chunks_exact(self.element_len)
            .zip(&self.indicators)
            .take(rows)
            .map(|(bytes, indicator)| Value::decode(self.c_type, bytes, *indicator, ordinal))
            .collect()
    }
}

/// Block-fetching reader over one query.
///
/// Owns the column buffers bound to its statement, which keeps them alive and
/// in place for the whole fetch loop. The scan borrows the database it runs
/// on, so a transaction cannot end while one of its scans is still open.
pub struct OdbcScan<'db> {
    // declared before `buffers` so the handle is freed before the memory
    stmt: Statement<'db>,
    columns: Vec<ColumnDescription>,
    buffers: Vec<ColumnBuffer>,
    row_array_size: usize,
    exhausted: bool,
}

impl<'db> OdbcScan<'db> {
    /// Prepares `sql`, binds a buffer per result column and executes.
    pub fn new(db: &'db OdbcDb, sql: &str, options: StatementOptions) -> Result<Self> {
        let mut stmt = db.statement(sql)?;
        let columns = stmt.describe_columns()?.to_vec();

        let mut buffers: Vec<ColumnBuffer> = columns
            .iter()
            .map(|column| ColumnBuffer::new(column, options.row_array_size))
            .collect();

        for (column, buffer) in columns.iter().zip(buffers.iter_mut()) {
            // the heap storage of both vectors is owned by the scan and never
            // reallocated, and the statement is dropped first
            unsafe {
                stmt.bind_column(
                    (column.ordinal() + 1) as u16,
                    buffer.c_type,
                    buffer.data.as_mut_ptr(),
                    buffer.element_len,
                    buffer.indicators.as_mut_ptr(),
                )?;
            }
        }

        stmt.execute(&options)?;

        Ok(OdbcScan {
            stmt,
            columns,
            buffers,
            row_array_size: options.row_array_size,
            exhausted: false,
        })
    }

    pub fn columns(&self) -> &[ColumnDescription] {
        &self.columns
    }

    pub fn statement(&self) -> &Statement<'db> {
        &self.stmt
    }

    /// Fetches the next block. Returns `None` once the result set is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<DataChunk>> {
        if self.exhausted {
            return Ok(None);
        }

        let rows = self.stmt.fetch()?.min(self.row_array_size);
        if rows == 0 {
            self.exhausted = true;
            return Ok(None);
        }

        let columns = self
            .buffers
            .iter()
            .enumerate()
            .map(|(ordinal, buffer)| buffer.decode(ordinal, rows))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(DataChunk { columns, len: rows }))
    }

    /// Drains every remaining block into one chunk.
    pub fn collect_all(&mut self) -> Result<DataChunk> {
        let mut out = DataChunk {
            columns: vec![Vec::new(); self.columns.len()],
            len: 0,
        };

        while let Some(chunk) = self.next_chunk()? {
            out.len += chunk.len;
            for (all, block) in out.columns.iter_mut().zip(chunk.columns) {
                all.extend(block);
            }
        }

        Ok(out)
    }
}
