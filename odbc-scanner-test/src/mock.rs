//! A scripted, in-process driver manager.
//!
//! Result sets are registered per SQL text. Every call is recorded so tests
//! can assert on exactly which native functions ran, and in which order.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use odbc_scanner_core::driver::{
    DescribedColumn, EnvironmentAttribute, FetchOrientation, StatementAttribute,
};
use odbc_scanner_core::{
    CType, DiagnosticRecord, Driver, HandleType, Nullability, RawHandle, SqlResult, SqlReturn,
    SqlType,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    AllocHandle,
    FreeHandle,
    SetEnvAttr,
    DriverConnect,
    Disconnect,
    Prepare,
    SetStmtAttr,
    BindCol,
    NumResultCols,
    DescribeCol,
    Execute,
    FetchScroll,
}

/// One recorded native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub function: Function,
    pub handle: RawHandle,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockColumn {
    pub name: String,
    pub data_type: SqlType,
    pub column_size: usize,
    pub decimal_digits: i16,
    pub nullable: bool,
}

impl MockColumn {
    pub fn new(name: &str, data_type: SqlType, column_size: usize) -> Self {
        MockColumn {
            name: name.to_string(),
            data_type,
            column_size,
            decimal_digits: 0,
            nullable: true,
        }
    }

    pub fn decimal_digits(mut self, decimal_digits: i16) -> Self {
        self.decimal_digits = decimal_digits;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockValue {
    Null,
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl From<i64> for MockValue {
    fn from(value: i64) -> Self {
        MockValue::Int(value)
    }
}

impl From<&str> for MockValue {
    fn from(value: &str) -> Self {
        MockValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MockResult {
    pub columns: Vec<MockColumn>,
    pub rows: Vec<Vec<MockValue>>,
}

impl MockResult {
    pub fn new(columns: Vec<MockColumn>) -> Self {
        MockResult {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: Vec<MockValue>) -> Self {
        self.rows.push(row);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    c_type: CType,
    // addresses, so the state stays `Send`
    buffer: usize,
    buffer_len: isize,
    indicator: usize,
}

#[derive(Debug, Default)]
struct StmtState {
    parent: RawHandle,
    sql: Option<String>,
    result: Option<MockResult>,
    bindings: BTreeMap<u16, Binding>,
    row_array_size: usize,
    rows_fetched: usize,
    cursor: Option<usize>,
}

#[derive(Debug)]
enum HandleState {
    Env { version_set: bool },
    Dbc { parent: RawHandle, connected: bool },
    Stmt(Box<StmtState>),
}

#[derive(Debug, Clone)]
struct Scripted {
    code: SqlReturn,
    record: DiagnosticRecord,
}

#[derive(Default)]
struct State {
    next_handle: usize,
    handles: HashMap<RawHandle, HandleState>,
    calls: Vec<Call>,
    results: HashMap<String, MockResult>,
    scripted: HashMap<Function, Scripted>,
    diagnostics: HashMap<RawHandle, Vec<DiagnosticRecord>>,
}

type Failure = (&'static str, String);

impl State {
    fn record(&mut self, function: Function, handle: RawHandle, detail: Option<String>) {
        self.calls.push(Call {
            function,
            handle,
            detail,
        });
        // every call clears the diagnostics of the handle it ran on
        self.diagnostics.remove(&handle);
    }

    fn fail<T>(&mut self, handle: RawHandle, (state, message): Failure) -> SqlResult<T> {
        self.diagnostics.insert(
            handle,
            vec![DiagnosticRecord {
                state: state.to_string(),
                native_error: 0,
                message,
            }],
        );
        SqlResult::Error(SqlReturn::ERROR)
    }

    /// Applies the outcome scripted for `function`, storing its record on
    /// `diag_handle`.
    fn scripted<T>(&mut self, function: Function, diag_handle: RawHandle) -> Outcome<T> {
        let scripted = match self.scripted.get(&function) {
            Some(s) => s.clone(),
            None => return Outcome::None,
        };

        if !diag_handle.is_null() {
            self.diagnostics
                .insert(diag_handle, vec![scripted.record.clone()]);
        }

        if scripted.code == SqlReturn::SUCCESS_WITH_INFO {
            Outcome::Info
        } else {
            Outcome::Fail(SqlResult::Error(scripted.code))
        }
    }

    fn finish<T>(&self, info: bool, value: T) -> SqlResult<T> {
        if info {
            SqlResult::SuccessWithInfo(value)
        } else {
            SqlResult::Success(value)
        }
    }

    fn stmt(&mut self, stmt: RawHandle) -> Option<&mut StmtState> {
        match self.handles.get_mut(&stmt) {
            Some(HandleState::Stmt(state)) => Some(state),
            _ => None,
        }
    }

    /// The type of a live handle and its flag: `version_set` for an
    /// environment, `connected` for a connection.
    fn kind(&self, handle: RawHandle) -> Option<(HandleType, bool)> {
        Some(match self.handles.get(&handle)? {
            HandleState::Env { version_set } => (HandleType::Env, *version_set),
            HandleState::Dbc { connected, .. } => (HandleType::Dbc, *connected),
            HandleState::Stmt(_) => (HandleType::Stmt, false),
        })
    }

    fn set_connected(&mut self, dbc: RawHandle, value: bool) {
        if let Some(HandleState::Dbc { connected, .. }) = self.handles.get_mut(&dbc) {
            *connected = value;
        }
    }

    fn has_children(&self, handle: RawHandle) -> bool {
        self.handles.values().any(|h| match h {
            HandleState::Dbc { parent, .. } => *parent == handle,
            HandleState::Stmt(s) => s.parent == handle,
            HandleState::Env { .. } => false,
        })
    }

    fn alloc(&mut self, state: HandleState) -> RawHandle {
        self.next_handle += 0x10;
        let handle = RawHandle(0x1000 + self.next_handle);
        self.handles.insert(handle, state);
        handle
    }
}

enum Outcome<T> {
    None,
    Info,
    Fail(SqlResult<T>),
}

/// Early-returns a scripted failure; otherwise yields whether the call should
/// report success with info.
macro_rules! scripted {
    ($state:expr, $function:expr, $handle:expr) => {
        match $state.scripted($function, $handle) {
            Outcome::None => false,
            Outcome::Info => true,
            Outcome::Fail(result) => return result,
        }
    };
}

/// A driver manager that serves registered result sets from memory.
#[derive(Default)]
pub struct MockDriver {
    state: Mutex<State>,
}

impl MockDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(MockDriver::default())
    }

    /// Serves `result` to statements prepared with exactly `sql`.
    pub fn register_result(&self, sql: &str, result: MockResult) {
        self.state().results.insert(sql.to_string(), result);
    }

    /// Makes every later call of `function` fail with `SQL_ERROR` and one
    /// diagnostic record.
    pub fn fail_on(&self, function: Function, state: &str, native_error: i32, message: &str) {
        self.script(function, SqlReturn::ERROR, state, native_error, message);
    }

    /// Makes every later call of `function` succeed with info.
    pub fn info_on(&self, function: Function, state: &str, message: &str) {
        self.script(function, SqlReturn::SUCCESS_WITH_INFO, state, 0, message);
    }

    pub fn clear_failures(&self) {
        self.state().scripted.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn functions(&self) -> Vec<Function> {
        self.state().calls.iter().map(|c| c.function).collect()
    }

    pub fn count(&self, function: Function) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.function == function)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Handles that have been allocated and not yet freed.
    pub fn live_handles(&self) -> usize {
        self.state().handles.len()
    }

    pub fn is_connected(&self, dbc: RawHandle) -> bool {
        matches!(
            self.state().handles.get(&dbc),
            Some(HandleState::Dbc {
                connected: true,
                ..
            })
        )
    }

    fn script(
        &self,
        function: Function,
        code: SqlReturn,
        state: &str,
        native_error: i32,
        message: &str,
    ) {
        self.state().scripted.insert(
            function,
            Scripted {
                code,
                record: DiagnosticRecord {
                    state: state.to_string(),
                    native_error,
                    message: message.to_string(),
                },
            },
        );
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // a panicking test must not take the others down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Debug for MockDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl Driver for MockDriver {
    fn alloc_handle(&self, handle_type: HandleType, parent: RawHandle) -> SqlResult<RawHandle> {
        let mut state = self.state();
        state.record(Function::AllocHandle, parent, Some(handle_type.to_string()));
        let info = scripted!(state, Function::AllocHandle, parent);

        let handle = match (handle_type, state.kind(parent)) {
            (HandleType::Env, None) if parent.is_null() => {
                state.alloc(HandleState::Env { version_set: false })
            }
            (HandleType::Dbc, Some((HandleType::Env, version_set))) => {
                if !version_set {
                    return state.fail(
                        parent,
                        ("HY010", "ODBC version has not been set".to_string()),
                    );
                }
                state.alloc(HandleState::Dbc {
                    parent,
                    connected: false,
                })
            }
            (HandleType::Stmt, Some((HandleType::Dbc, connected))) => {
                if !connected {
                    return state.fail(parent, ("08003", "connection not open".to_string()));
                }
                state.alloc(HandleState::Stmt(Box::new(StmtState {
                    parent,
                    row_array_size: 1,
                    ..StmtState::default()
                })))
            }
            _ => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };

        state.finish(info, handle)
    }

    fn free_handle(&self, handle_type: HandleType, handle: RawHandle) -> SqlResult<()> {
        let mut state = self.state();
        state.record(Function::FreeHandle, handle, Some(handle_type.to_string()));
        let info = scripted!(state, Function::FreeHandle, handle);

        match state.kind(handle) {
            Some((kind, connected)) if kind == handle_type => {
                if handle_type == HandleType::Dbc && connected {
                    return state.fail(handle, ("HY010", "connection is still open".to_string()));
                }
                if state.has_children(handle) {
                    return state.fail(
                        handle,
                        ("HY010", "child handles are still allocated".to_string()),
                    );
                }
            }
            _ => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        }

        state.handles.remove(&handle);
        state.finish(info, ())
    }

    fn set_env_attr(&self, env: RawHandle, attribute: EnvironmentAttribute) -> SqlResult<()> {
        let mut state = self.state();
        state.record(Function::SetEnvAttr, env, Some(format!("{:?}", attribute)));
        let info = scripted!(state, Function::SetEnvAttr, env);

        match state.handles.get_mut(&env) {
            Some(HandleState::Env { version_set }) => *version_set = true,
            _ => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        }
        state.finish(info, ())
    }

    fn driver_connect(
        &self,
        dbc: RawHandle,
        connection_string: &str,
        max_out_len: usize,
    ) -> SqlResult<String> {
        let mut state = self.state();
        state.record(
            Function::DriverConnect,
            dbc,
            Some(connection_string.to_string()),
        );
        let info = scripted!(state, Function::DriverConnect, dbc);

        match state.kind(dbc) {
            Some((HandleType::Dbc, false)) => state.set_connected(dbc, true),
            Some((HandleType::Dbc, true)) => {
                return state.fail(dbc, ("08002", "connection name in use".to_string()))
            }
            _ => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        }

        let mut completed = connection_string.to_string();
        while completed.len() > max_out_len {
            completed.pop();
        }
        state.finish(info, completed)
    }

    fn disconnect(&self, dbc: RawHandle) -> SqlResult<()> {
        let mut state = self.state();
        state.record(Function::Disconnect, dbc, None);
        let info = scripted!(state, Function::Disconnect, dbc);

        match state.kind(dbc) {
            Some((HandleType::Dbc, true)) => state.set_connected(dbc, false),
            Some((HandleType::Dbc, false)) => {
                return state.fail(dbc, ("08003", "connection not open".to_string()))
            }
            _ => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        }
        state.finish(info, ())
    }

    fn prepare(&self, stmt: RawHandle, sql: &str) -> SqlResult<()> {
        let mut state = self.state();
        state.record(Function::Prepare, stmt, Some(sql.to_string()));
        let info = scripted!(state, Function::Prepare, stmt);

        let result = state.results.get(sql).cloned();
        match state.stmt(stmt) {
            Some(s) => {
                s.sql = Some(sql.to_string());
                s.result = Some(result.unwrap_or_default());
                s.bindings.clear();
                s.cursor = None;
            }
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        }
        state.finish(info, ())
    }

    unsafe fn set_stmt_attr(
        &self,
        stmt: RawHandle,
        attribute: StatementAttribute,
    ) -> SqlResult<()> {
        let mut state = self.state();
        state.record(Function::SetStmtAttr, stmt, Some(attribute.name().to_string()));
        let info = scripted!(state, Function::SetStmtAttr, stmt);

        let s = match state.stmt(stmt) {
            Some(s) => s,
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };
        match attribute {
            StatementAttribute::RowBindByColumn => {}
            StatementAttribute::RowArraySize(size) => s.row_array_size = size,
            StatementAttribute::RowsFetchedPtr(ptr) => s.rows_fetched = ptr as usize,
        }
        state.finish(info, ())
    }

    unsafe fn bind_col(
        &self,
        stmt: RawHandle,
        column: u16,
        c_type: CType,
        buffer: *mut u8,
        buffer_len: isize,
        indicator: *mut isize,
    ) -> SqlResult<()> {
        let mut state = self.state();
        state.record(
            Function::BindCol,
            stmt,
            Some(format!("{} {:?} {}", column, c_type, buffer_len)),
        );
        let info = scripted!(state, Function::BindCol, stmt);

        let width = match state.stmt(stmt) {
            Some(s) => s.result.as_ref().map_or(0, |r| r.columns.len()),
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };
        if column == 0 || usize::from(column) > width {
            return state.fail(stmt, ("07009", format!("invalid column number {}", column)));
        }
        let s = match state.stmt(stmt) {
            Some(s) => s,
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };
        s.bindings.insert(
            column,
            Binding {
                c_type,
                buffer: buffer as usize,
                buffer_len,
                indicator: indicator as usize,
            },
        );
        state.finish(info, ())
    }

    fn num_result_cols(&self, stmt: RawHandle) -> SqlResult<i16> {
        let mut state = self.state();
        state.record(Function::NumResultCols, stmt, None);
        let info = scripted!(state, Function::NumResultCols, stmt);

        let count = match state.stmt(stmt) {
            Some(StmtState {
                result: Some(result),
                ..
            }) => result.columns.len() as i16,
            Some(_) => {
                return state.fail(stmt, ("HY010", "statement is not prepared".to_string()))
            }
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };
        state.finish(info, count)
    }

    fn describe_col(&self, stmt: RawHandle, column: u16) -> SqlResult<DescribedColumn> {
        let mut state = self.state();
        state.record(Function::DescribeCol, stmt, Some(column.to_string()));
        let info = scripted!(state, Function::DescribeCol, stmt);

        let described = match state.stmt(stmt) {
            Some(s) => s
                .result
                .as_ref()
                .and_then(|r| r.columns.get(usize::from(column).wrapping_sub(1)))
                .map(|c| DescribedColumn {
                    name: c.name.clone(),
                    data_type: c.data_type,
                    column_size: c.column_size,
                    decimal_digits: c.decimal_digits,
                    nullability: if c.nullable {
                        Nullability::Nullable
                    } else {
                        Nullability::NoNulls
                    },
                }),
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };

        match described {
            Some(described) => state.finish(info, described),
            None => state.fail(stmt, ("07009", format!("invalid column number {}", column))),
        }
    }

    unsafe fn execute(&self, stmt: RawHandle) -> SqlResult<()> {
        let mut state = self.state();
        let sql = state.stmt(stmt).and_then(|s| s.sql.clone());
        state.record(Function::Execute, stmt, sql);
        let info = scripted!(state, Function::Execute, stmt);

        match state.stmt(stmt) {
            Some(s) if s.result.is_some() => s.cursor = Some(0),
            Some(_) => {
                return state.fail(stmt, ("HY010", "statement is not prepared".to_string()))
            }
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        }
        state.finish(info, ())
    }

    unsafe fn fetch_scroll(
        &self,
        stmt: RawHandle,
        orientation: FetchOrientation,
        offset: isize,
    ) -> SqlResult<()> {
        let mut state = self.state();
        state.record(
            Function::FetchScroll,
            stmt,
            Some(format!("{:?} {}", orientation, offset)),
        );
        let info = scripted!(state, Function::FetchScroll, stmt);

        let open = match state.stmt(stmt) {
            Some(s) => {
                s.cursor.is_some() && s.result.as_ref().map_or(false, |r| !r.columns.is_empty())
            }
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };
        if !open {
            return state.fail(stmt, ("24000", "invalid cursor state".to_string()));
        }

        let null = MockValue::Null;
        let mut failure = None;
        let s = match state.stmt(stmt) {
            Some(s) => s,
            None => return SqlResult::Error(SqlReturn::INVALID_HANDLE),
        };
        let (cursor, result) = match (s.cursor, s.result.as_ref()) {
            (Some(cursor), Some(result)) => (cursor, result),
            _ => return SqlResult::Error(SqlReturn::ERROR),
        };

        let block = result
            .rows
            .len()
            .saturating_sub(cursor)
            .min(s.row_array_size);

        if block == 0 {
            if s.rows_fetched != 0 {
                *(s.rows_fetched as *mut usize) = 0;
            }
            return SqlResult::NoData;
        }

        'rows: for (i, row) in result.rows[cursor..cursor + block].iter().enumerate() {
            for (column, binding) in &s.bindings {
                let value = row.get(usize::from(*column) - 1).unwrap_or(&null);
                if let Err(e) = write_cell(binding, i, value) {
                    failure = Some(e);
                    break 'rows;
                }
            }
        }

        if failure.is_none() {
            s.cursor = Some(cursor + block);
            if s.rows_fetched != 0 {
                *(s.rows_fetched as *mut usize) = block;
            }
        }

        match failure {
            Some(failure) => state.fail(stmt, failure),
            None => state.finish(info, ()),
        }
    }

    fn diagnostic_record(
        &self,
        _handle_type: HandleType,
        handle: RawHandle,
        record: i16,
    ) -> Option<DiagnosticRecord> {
        let index = usize::try_from(record).ok()?.checked_sub(1)?;
        self.state().diagnostics.get(&handle)?.get(index).cloned()
    }
}

enum Cell {
    Null,
    Fixed(Vec<u8>),
    Text(Vec<u8>),
    Binary(Vec<u8>),
}

fn encode(c_type: CType, value: &MockValue) -> Option<Cell> {
    Some(match (c_type, value) {
        (_, MockValue::Null) => Cell::Null,
        (CType::Short, MockValue::Int(v)) => Cell::Fixed((*v as i16).to_ne_bytes().to_vec()),
        (CType::Long, MockValue::Int(v)) => Cell::Fixed((*v as i32).to_ne_bytes().to_vec()),
        (CType::SBigInt, MockValue::Int(v)) => Cell::Fixed(v.to_ne_bytes().to_vec()),
        (CType::Double, MockValue::Int(v)) => Cell::Fixed((*v as f64).to_ne_bytes().to_vec()),
        (CType::Double, MockValue::Double(v)) => Cell::Fixed(v.to_ne_bytes().to_vec()),
        (CType::Float, MockValue::Int(v)) => Cell::Fixed((*v as f32).to_ne_bytes().to_vec()),
        (CType::Float, MockValue::Double(v)) => Cell::Fixed((*v as f32).to_ne_bytes().to_vec()),
        (CType::Char, MockValue::Text(v)) => Cell::Text(v.as_bytes().to_vec()),
        (CType::Char, MockValue::Int(v)) => Cell::Text(v.to_string().into_bytes()),
        (CType::Char, MockValue::Double(v)) => Cell::Text(v.to_string().into_bytes()),
        (CType::Binary, MockValue::Bytes(v)) => Cell::Binary(v.clone()),
        (CType::Binary, MockValue::Text(v)) => Cell::Binary(v.as_bytes().to_vec()),
        (CType::TypeDate, MockValue::Date(d)) => Cell::Fixed(date_struct(d)),
        (CType::TypeTime, MockValue::Time(t)) => Cell::Fixed(time_struct(t)),
        (CType::TypeTimestamp, MockValue::Timestamp(ts)) => {
            let mut out = date_struct(&ts.date());
            out.extend(time_struct(&ts.time()));
            out.extend_from_slice(&ts.time().nanosecond().to_ne_bytes());
            Cell::Fixed(out)
        }
        _ => return None,
    })
}

fn date_struct(d: &NaiveDate) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&(d.year() as i16).to_ne_bytes());
    out.extend_from_slice(&(d.month() as u16).to_ne_bytes());
    out.extend_from_slice(&(d.day() as u16).to_ne_bytes());
    out
}

fn time_struct(t: &NaiveTime) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&(t.hour() as u16).to_ne_bytes());
    out.extend_from_slice(&(t.minute() as u16).to_ne_bytes());
    out.extend_from_slice(&(t.second() as u16).to_ne_bytes());
    out
}

/// Writes `value` into element `row` of a bound column.
///
/// # Safety
///
/// The binding must point to live buffers of at least `row + 1` elements.
unsafe fn write_cell(binding: &Binding, row: usize, value: &MockValue) -> Result<(), Failure> {
    let len = binding.buffer_len.max(0) as usize;
    let indicator = (binding.indicator as *mut isize).add(row);
    let out = std::slice::from_raw_parts_mut((binding.buffer as *mut u8).add(row * len), len);

    let cell = encode(binding.c_type, value).ok_or_else(|| {
        (
            "07006",
            format!("cannot convert {:?} to {:?}", value, binding.c_type),
        )
    })?;

    match cell {
        Cell::Null => *indicator = -1,
        Cell::Fixed(bytes) => {
            if bytes.len() > len {
                return Err((
                    "HY090",
                    format!("buffer of {} bytes cannot hold {}", len, bytes.len()),
                ));
            }
            out[..bytes.len()].copy_from_slice(&bytes);
            *indicator = bytes.len() as isize;
        }
        Cell::Text(bytes) => {
            // truncated to leave room for the terminator; the indicator keeps
            // the full length
            let n = bytes.len().min(len.saturating_sub(1));
            out[..n].copy_from_slice(&bytes[..n]);
            if n < len {
                out[n] = 0;
            }
            *indicator = bytes.len() as isize;
        }
        Cell::Binary(bytes) => {
            let n = bytes.len().min(len);
            out[..n].copy_from_slice(&bytes[..n]);
            *indicator = bytes.len() as isize;
        }
    }

    Ok(())
}
