use crate::error::Error;
use crate::type_info::CType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{self, Display, Formatter};

/// Indicator value marking a NULL cell (`SQL_NULL_DATA`).
pub const NULL_DATA: isize = -1;

/// Indicator value for a length the driver could not determine (`SQL_NO_TOTAL`).
pub const NO_TOTAL: isize = -4;

/// One decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widens integer values; parses text (DECIMAL and NUMERIC arrive as text).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Decodes the element of a column buffer bound as `c_type`.
    ///
    /// `bytes` is the whole element (the bound element length) and
    /// `indicator` the length/indicator value the driver wrote for it.
    pub fn decode(
        c_type: CType,
        bytes: &[u8],
        indicator: isize,
        column: usize,
    ) -> Result<Value, Error> {
        if indicator == NULL_DATA {
            return Ok(Value::Null);
        }

        let value = match c_type {
            CType::Short => Value::SmallInt(i16::from_ne_bytes(fixed(bytes, column)?)),
            CType::Long => Value::Integer(i32::from_ne_bytes(fixed(bytes, column)?)),
            CType::SBigInt => Value::BigInt(i64::from_ne_bytes(fixed(bytes, column)?)),
            CType::Double => Value::Double(f64::from_ne_bytes(fixed(bytes, column)?)),
            CType::Float => Value::Float(f32::from_ne_bytes(fixed(bytes, column)?)),
            CType::Char => {
                // the last byte is reserved for the terminator
                let capacity = bytes.len().saturating_sub(1);
                let len = match usize::try_from(indicator) {
                    Ok(len) => len.min(capacity),
                    Err(_) => bytes[..capacity]
                        .iter()
                        .position(|b| *b == 0)
                        .unwrap_or(capacity),
                };
                Value::Text(String::from_utf8_lossy(&bytes[..len]).into_owned())
            }
            CType::Binary => {
                let len = usize::try_from(indicator)
                    .map(|len| len.min(bytes.len()))
                    .unwrap_or(bytes.len());
                Value::Blob(bytes[..len].to_vec())
            }
            CType::TypeDate => Value::Date(decode_date(bytes, column)?),
            CType::TypeTime => Value::Time(decode_time(bytes, column)?),
            CType::TypeTimestamp => {
                // SQL_TIMESTAMP_STRUCT: year, month, day, hour, minute, second, fraction
                let date = decode_date(bytes, column)?;
                let hour = u16_at(bytes, 6, column)?;
                let minute = u16_at(bytes, 8, column)?;
                let second = u16_at(bytes, 10, column)?;
                let fraction =
                    u32::from_ne_bytes(fixed(slice_at(bytes, 12, 4, column)?, column)?);
                let time = NaiveTime::from_hms_nano_opt(
                    u32::from(hour),
                    u32::from(minute),
                    u32::from(second),
                    fraction,
                )
                .ok_or_else(|| {
                    decode_error(
                        column,
                        format!(
                            "invalid time {:02}:{:02}:{:02}.{:09}",
                            hour, minute, second, fraction
                        ),
                    )
                })?;
                Value::Timestamp(NaiveDateTime::new(date, time))
            }
        };

        Ok(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::SmallInt(v) => Display::fmt(v, f),
            Value::Integer(v) => Display::fmt(v, f),
            Value::BigInt(v) => Display::fmt(v, f),
            Value::Float(v) => Display::fmt(v, f),
            Value::Double(v) => Display::fmt(v, f),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => {
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Date(v) => Display::fmt(v, f),
            Value::Time(v) => Display::fmt(v, f),
            Value::Timestamp(v) => Display::fmt(v, f),
        }
    }
}

fn decode_error(column: usize, message: String) -> Error {
    Error::Decode { column, message }
}

fn slice_at(bytes: &[u8], offset: usize, len: usize, column: usize) -> Result<&[u8], Error> {
    bytes.get(offset..offset + len).ok_or_else(|| {
        decode_error(
            column,
            format!(
                "buffer of {} bytes is too short, need {}",
                bytes.len(),
                offset + len
            ),
        )
    })
}

fn fixed<const N: usize>(bytes: &[u8], column: usize) -> Result<[u8; N], Error> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice_at(bytes, 0, N, column)?);
    Ok(out)
}

fn u16_at(bytes: &[u8], offset: usize, column: usize) -> Result<u16, Error> {
    Ok(u16::from_ne_bytes(fixed(slice_at(bytes, offset, 2, column)?, column)?))
}

// SQL_DATE_STRUCT: i16 year, u16 month, u16 day
fn decode_date(bytes: &[u8], column: usize) -> Result<NaiveDate, Error> {
    let year = i16::from_ne_bytes(fixed(bytes, column)?);
    let month = u16_at(bytes, 2, column)?;
    let day = u16_at(bytes, 4, column)?;

    NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day)).ok_or_else(|| {
        decode_error(
            column,
            format!("invalid date {:04}-{:02}-{:02}", year, month, day),
        )
    })
}

// SQL_TIME_STRUCT: u16 hour, u16 minute, u16 second
fn decode_time(bytes: &[u8], column: usize) -> Result<NaiveTime, Error> {
    let hour = u16_at(bytes, 0, column)?;
    let minute = u16_at(bytes, 2, column)?;
    let second = u16_at(bytes, 4, column)?;

    NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), u32::from(second)).ok_or_else(
        || {
            decode_error(
                column,
                format!("invalid time {:02}:{:02}:{:02}", hour, minute, second),
            )
        },
    )
}
