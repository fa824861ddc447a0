//! Forwards [`Driver`] calls to the system driver manager through `odbc_api::sys`.

use super::{
    DescribedColumn, Driver, EnvironmentAttribute, FetchOrientation, HandleType, RawHandle,
    SqlResult, SqlReturn, StatementAttribute,
};
use crate::column::Nullability;
use crate::error::DiagnosticRecord;
use crate::type_info::{CType, SqlType};
use odbc_api::sys::{
    self as ffi, CDataType, DriverConnectOption, HDbc, HEnv, HStmt, Handle, Integer, Len,
    Pointer, SmallInt, SqlDataType, ULen, WChar,
};
use std::ptr::null_mut;

const NAME_BUFFER_LEN: usize = 256;
const MESSAGE_BUFFER_LEN: usize = 1024;

/// The system ODBC driver manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDriver;

impl NativeDriver {
    pub fn new() -> Self {
        NativeDriver
    }
}

fn handle_type(handle_type: HandleType) -> ffi::HandleType {
    match handle_type {
        HandleType::Env => ffi::HandleType::Env,
        HandleType::Dbc => ffi::HandleType::Dbc,
        HandleType::Stmt => ffi::HandleType::Stmt,
    }
}

fn c_data_type(c_type: CType) -> CDataType {
    match c_type {
        CType::Short => CDataType::SShort,
        CType::Long => CDataType::SLong,
        CType::SBigInt => CDataType::SBigInt,
        CType::Double => CDataType::Double,
        CType::Float => CDataType::Float,
        CType::Char => CDataType::Char,
        CType::Binary => CDataType::Binary,
        CType::TypeDate => CDataType::TypeDate,
        CType::TypeTime => CDataType::TypeTime,
        CType::TypeTimestamp => CDataType::TypeTimestamp,
    }
}

fn result<T>(ret: ffi::SqlReturn, value: T) -> SqlResult<T> {
    SqlResult::from_return(SqlReturn(ret.0), value)
}

fn clamp_small_int(len: usize) -> SmallInt {
    len.min(SmallInt::MAX as usize) as SmallInt
}

fn to_wide(text: &str) -> Vec<WChar> {
    text.encode_utf16().collect()
}

fn from_wide(buf: &[WChar], len: usize) -> String {
    String::from_utf16_lossy(&buf[..len.min(buf.len())])
}

impl Driver for NativeDriver {
    fn alloc_handle(&self, kind: HandleType, parent: RawHandle) -> SqlResult<RawHandle> {
        let mut out: Handle = null_mut();
        let ret = unsafe { ffi::SQLAllocHandle(handle_type(kind), parent.0 as Handle, &mut out) };
        result(ret, RawHandle(out as usize))
    }

    fn free_handle(&self, kind: HandleType, handle: RawHandle) -> SqlResult<()> {
        let ret = unsafe { ffi::SQLFreeHandle(handle_type(kind), handle.0 as Handle) };
        result(ret, ())
    }

    fn set_env_attr(&self, env: RawHandle, attribute: EnvironmentAttribute) -> SqlResult<()> {
        let ret = match attribute {
            EnvironmentAttribute::OdbcVersion(version) => unsafe {
                ffi::SQLSetEnvAttr(
                    env.0 as HEnv,
                    ffi::EnvironmentAttribute::OdbcVersion,
                    version.code() as Pointer,
                    0,
                )
            },
        };
        result(ret, ())
    }

    fn driver_connect(
        &self,
        dbc: RawHandle,
        connection_string: &str,
        max_out_len: usize,
    ) -> SqlResult<String> {
        let input = to_wide(connection_string);
        let mut output: Vec<WChar> = vec![0; max_out_len + 1];
        let mut output_len: SmallInt = 0;

        let ret = unsafe {
            ffi::SQLDriverConnectW(
                dbc.0 as HDbc,
                null_mut(),
                input.as_ptr(),
                clamp_small_int(input.len()),
                output.as_mut_ptr(),
                clamp_small_int(max_out_len),
                &mut output_len,
                DriverConnectOption::NoPrompt,
            )
        };

        let normalized = from_wide(&output, output_len.max(0) as usize);
        result(ret, normalized)
    }

    fn disconnect(&self, dbc: RawHandle) -> SqlResult<()> {
        let ret = unsafe { ffi::SQLDisconnect(dbc.0 as HDbc) };
        result(ret, ())
    }

    fn prepare(&self, stmt: RawHandle, sql: &str) -> SqlResult<()> {
        let text = to_wide(sql);
        let ret = unsafe {
            ffi::SQLPrepareW(stmt.0 as HStmt, text.as_ptr(), text.len() as Integer)
        };
        result(ret, ())
    }

    unsafe fn set_stmt_attr(
        &self,
        stmt: RawHandle,
        attribute: StatementAttribute,
    ) -> SqlResult<()> {
        let (attr, value) = match attribute {
            // SQL_BIND_BY_COLUMN
            StatementAttribute::RowBindByColumn => {
                (ffi::StatementAttribute::RowBindType, 0 as Pointer)
            }
            StatementAttribute::RowArraySize(size) => {
                (ffi::StatementAttribute::RowArraySize, size as Pointer)
            }
            StatementAttribute::RowsFetchedPtr(ptr) => {
                (ffi::StatementAttribute::RowsFetchedPtr, ptr as *mut ULen as Pointer)
            }
        };
        let ret = ffi::SQLSetStmtAttrW(stmt.0 as HStmt, attr, value, 0);
        result(ret, ())
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
        let ret = ffi::SQLBindCol(
            stmt.0 as HStmt,
            column,
            c_data_type(c_type),
            buffer as Pointer,
            buffer_len as Len,
            indicator as *mut Len,
        );
        result(ret, ())
    }

    fn num_result_cols(&self, stmt: RawHandle) -> SqlResult<i16> {
        let mut count: SmallInt = 0;
        let ret = unsafe { ffi::SQLNumResultCols(stmt.0 as HStmt, &mut count) };
        result(ret, count)
    }

    fn describe_col(&self, stmt: RawHandle, column: u16) -> SqlResult<DescribedColumn> {
        let mut name: Vec<WChar> = vec![0; NAME_BUFFER_LEN];
        let mut name_len: SmallInt = 0;
        let mut data_type = SqlDataType::UNKNOWN_TYPE;
        let mut column_size: ULen = 0;
        let mut decimal_digits: SmallInt = 0;
        let mut nullable = ffi::Nullability::UNKNOWN;

        let ret = unsafe {
            ffi::SQLDescribeColW(
                stmt.0 as HStmt,
                column,
                name.as_mut_ptr(),
                clamp_small_int(name.len()),
                &mut name_len,
                &mut data_type,
                &mut column_size,
                &mut decimal_digits,
                &mut nullable,
            )
        };

        let described = DescribedColumn {
            name: from_wide(&name, name_len.max(0) as usize),
            data_type: SqlType(data_type.0),
            column_size,
            decimal_digits,
            nullability: Nullability::from_raw(nullable.0),
        };
        result(ret, described)
    }

    unsafe fn execute(&self, stmt: RawHandle) -> SqlResult<()> {
        let ret = ffi::SQLExecute(stmt.0 as HStmt);
        result(ret, ())
    }

    unsafe fn fetch_scroll(
        &self,
        stmt: RawHandle,
        orientation: FetchOrientation,
        offset: isize,
    ) -> SqlResult<()> {
        let orientation = match orientation {
            FetchOrientation::Next => ffi::FetchOrientation::Next,
        };
        let ret = ffi::SQLFetchScroll(stmt.0 as HStmt, orientation, offset as Len);
        result(ret, ())
    }

    fn diagnostic_record(
        &self,
        kind: HandleType,
        handle: RawHandle,
        record: i16,
    ) -> Option<DiagnosticRecord> {
        let mut state: [WChar; 6] = [0; 6];
        let mut native_error: Integer = 0;
        let mut message: Vec<WChar> = vec![0; MESSAGE_BUFFER_LEN];
        let mut message_len: SmallInt = 0;

        let ret = unsafe {
            ffi::SQLGetDiagRecW(
                handle_type(kind),
                handle.0 as Handle,
                record,
                state.as_mut_ptr(),
                &mut native_error,
                message.as_mut_ptr(),
                clamp_small_int(message.len()),
                &mut message_len,
            )
        };

        if !result(ret, ()).is_success() {
            return None;
        }

        Some(DiagnosticRecord {
            state: from_wide(&state, 5),
            native_error,
            message: from_wide(&message, message_len.max(0) as usize),
        })
    }
}
