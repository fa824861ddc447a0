use crate::error::Error;
use std::fmt::{self, Display, Formatter};
use std::mem::size_of;

/// An SQL data type code as reported by `SQLDescribeCol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlType(pub i16);

impl SqlType {
    pub const UNKNOWN: SqlType = SqlType(0);
    pub const CHAR: SqlType = SqlType(1);
    pub const NUMERIC: SqlType = SqlType(2);
    pub const DECIMAL: SqlType = SqlType(3);
    pub const INTEGER: SqlType = SqlType(4);
    pub const SMALLINT: SqlType = SqlType(5);
    pub const FLOAT: SqlType = SqlType(6);
    pub const REAL: SqlType = SqlType(7);
    pub const DOUBLE: SqlType = SqlType(8);
    pub const VARCHAR: SqlType = SqlType(12);
    pub const TYPE_DATE: SqlType = SqlType(91);
    pub const TYPE_TIME: SqlType = SqlType(92);
    pub const TYPE_TIMESTAMP: SqlType = SqlType(93);
    pub const LONGVARCHAR: SqlType = SqlType(-1);
    pub const BINARY: SqlType = SqlType(-2);
    pub const VARBINARY: SqlType = SqlType(-3);
    pub const LONGVARBINARY: SqlType = SqlType(-4);
    pub const BIGINT: SqlType = SqlType(-5);
    pub const TINYINT: SqlType = SqlType(-6);
    pub const BIT: SqlType = SqlType(-7);
    pub const WCHAR: SqlType = SqlType(-8);
    pub const WVARCHAR: SqlType = SqlType(-9);
    pub const WLONGVARCHAR: SqlType = SqlType(-10);
    pub const GUID: SqlType = SqlType(-11);

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            SqlType::CHAR => "CHAR",
            SqlType::NUMERIC => "NUMERIC",
            SqlType::DECIMAL => "DECIMAL",
            SqlType::INTEGER => "INTEGER",
            SqlType::SMALLINT => "SMALLINT",
            SqlType::FLOAT => "FLOAT",
            SqlType::REAL => "REAL",
            SqlType::DOUBLE => "DOUBLE",
            SqlType::VARCHAR => "VARCHAR",
            SqlType::TYPE_DATE => "DATE",
            SqlType::TYPE_TIME => "TIME",
            SqlType::TYPE_TIMESTAMP => "TIMESTAMP",
            SqlType::LONGVARCHAR => "LONGVARCHAR",
            SqlType::BINARY => "BINARY",
            SqlType::VARBINARY => "VARBINARY",
            SqlType::LONGVARBINARY => "LONGVARBINARY",
            SqlType::BIGINT => "BIGINT",
            SqlType::TINYINT => "TINYINT",
            SqlType::BIT => "BIT",
            SqlType::WCHAR => "WCHAR",
            SqlType::WVARCHAR => "WVARCHAR",
            SqlType::WLONGVARCHAR => "WLONGVARCHAR",
            SqlType::GUID => "GUID",
            _ => return None,
        })
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// The C representation a column is bound to for block fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CType {
    Short,
    Long,
    SBigInt,
    Double,
    Float,
    Char,
    Binary,
    TypeDate,
    TypeTime,
    TypeTimestamp,
}

/// Maps a driver-reported SQL type onto the C representation used to bind it
/// and the byte length of one element of the bound buffer.
///
/// The table is closed on purpose: `BIT`, wide characters, LOB locators,
/// graphic types, XML and row ids are rejected with
/// [`Error::UnsupportedType`].
///
/// DECIMAL and NUMERIC are fetched as text sized `column_size + 1`, which does
/// not leave room for the sign or the decimal point.
pub fn map_type(
    sql_type: SqlType,
    column_size: usize,
    _decimal_digits: i16,
) -> Result<(CType, usize), Error> {
    let text_len = column_size + size_of::<u8>();

    let mapped = match sql_type {
        SqlType::SMALLINT => (CType::Short, size_of::<i16>()),
        SqlType::INTEGER => (CType::Long, size_of::<i32>()),
        SqlType::BIGINT => (CType::SBigInt, size_of::<i64>()),
        SqlType::DECIMAL | SqlType::NUMERIC => (CType::Char, text_len),
        SqlType::DOUBLE | SqlType::FLOAT => (CType::Double, size_of::<f64>()),
        SqlType::REAL => (CType::Float, size_of::<f32>()),
        SqlType::CHAR | SqlType::VARCHAR | SqlType::LONGVARCHAR => (CType::Char, text_len),
        SqlType::BINARY | SqlType::VARBINARY | SqlType::LONGVARBINARY => {
            (CType::Binary, text_len)
        }
        SqlType::TYPE_DATE => (CType::TypeDate, text_len),
        SqlType::TYPE_TIME => (CType::TypeTime, text_len),
        SqlType::TYPE_TIMESTAMP => (CType::TypeTimestamp, text_len),
        other => return Err(Error::UnsupportedType { sql_type: other }),
    };

    Ok(mapped)
}
