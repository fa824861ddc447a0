use crate::driver::DescribedColumn;
use crate::error::Error;
use crate::type_info::{map_type, CType, SqlType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    NoNulls,
    Nullable,
    Unknown,
}

impl Nullability {
    /// From `SQL_NO_NULLS` (0), `SQL_NULLABLE` (1) or anything else.
    pub fn from_raw(raw: i16) -> Self {
        match raw {
            0 => Nullability::NoNulls,
            1 => Nullability::Nullable,
            _ => Nullability::Unknown,
        }
    }

    pub fn could_be_nullable(self) -> bool {
        !matches!(self, Nullability::NoNulls)
    }
}

/// Static metadata of one result column, resolved once after prepare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub(crate) name: String,
    pub(crate) ordinal: usize,
    pub(crate) sql_type: SqlType,
    pub(crate) c_type: CType,
    pub(crate) length: usize,
    pub(crate) size: usize,
    pub(crate) decimal_digits: i16,
    pub(crate) nullability: Nullability,
}

impl ColumnDescription {
    pub(crate) fn resolve(ordinal: usize, described: DescribedColumn) -> Result<Self, Error> {
        let (c_type, length) = map_type(
            described.data_type,
            described.column_size,
            described.decimal_digits,
        )?;

        Ok(ColumnDescription {
            name: described.name,
            ordinal,
            sql_type: described.data_type,
            c_type,
            length,
            size: described.column_size,
            decimal_digits: described.decimal_digits,
            nullability: described.nullability,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position; the driver ordinal is `ordinal() + 1`.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn c_type(&self) -> CType {
        self.c_type
    }

    /// Byte length of one element of the bound buffer.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Declared column size.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn decimal_digits(&self) -> i16 {
        self.decimal_digits
    }

    pub fn nullability(&self) -> Nullability {
        self.nullability
    }
}
