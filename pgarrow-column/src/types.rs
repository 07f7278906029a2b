//! Static type vocabulary shared by descriptors, bindings and encoders.

use std::fmt;

/// PostgreSQL object identifier.
pub type Oid = u32;

/// `InvalidOid`: used by the catalog for "no relation" / "no element type".
pub const INVALID_OID: Oid = 0;

/// Namespace of the built-in types that get dedicated bindings.
pub const PG_CATALOG_NAMESPACE: &str = "pg_catalog";

/// Arrow buffers are padded to 64 bytes in the IPC body.
pub const ARROW_ALIGNMENT: usize = 64;

/// Round `len` up to [`ARROW_ALIGNMENT`].
#[inline]
pub fn arrow_align(len: usize) -> usize {
    len.div_ceil(ARROW_ALIGNMENT) * ARROW_ALIGNMENT
}

/// Storage alignment class of a source type (`pg_type.typalign`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    Char,
    Short,
    Int,
    Double,
}

impl Alignment {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'c' => Some(Alignment::Char),
            's' => Some(Alignment::Short),
            'i' => Some(Alignment::Int),
            'd' => Some(Alignment::Double),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Alignment::Char => 'c',
            Alignment::Short => 's',
            Alignment::Int => 'i',
            Alignment::Double => 'd',
        }
    }

    /// Alignment in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Alignment::Char => 1,
            Alignment::Short => 2,
            Alignment::Int => 4,
            Alignment::Double => 8,
        }
    }
}

/// Supported type categories (`pg_type.typtype`).
///
/// Only base and composite types are representable. The catalog also knows
/// domains (`d`), enums (`e`), pseudo types (`p`), ranges (`r`) and
/// multiranges (`m`); those are rejected by [`TypeCategory::from_code`]
/// returning `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Base,
    Composite,
}

impl TypeCategory {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'b' => Some(TypeCategory::Base),
            'c' => Some(TypeCategory::Composite),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            TypeCategory::Base => 'b',
            TypeCategory::Composite => 'c',
        }
    }
}

/// Resolved Arrow type of a column.
///
/// This is a closed set: every per-type behaviour (`put_value`,
/// `stat_update`, Arrow field mapping) is a `match` over these variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrowTypeTag {
    Boolean,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal128 { precision: u8, scale: i8 },
    /// Days since the UNIX epoch.
    Date32,
    /// Microseconds since midnight.
    Time64Micros,
    /// Microseconds since the UNIX epoch; `utc` marks `timestamptz`.
    TimestampMicros { utc: bool },
    Utf8,
    Binary,
    Struct,
    List,
}

impl ArrowTypeTag {
    /// Number of physical buffers an Arrow array of this type carries in an
    /// IPC body, excluding its children.
    pub fn buffer_count(self) -> usize {
        match self {
            ArrowTypeTag::Struct => 1,
            ArrowTypeTag::Utf8 | ArrowTypeTag::Binary => 3,
            _ => 2,
        }
    }

    /// Bytes per value in the value buffer for fixed-width, byte-addressed
    /// types. `Boolean` is bit-packed and returns `None`.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            ArrowTypeTag::UInt8 => Some(1),
            ArrowTypeTag::Int16 | ArrowTypeTag::UInt16 => Some(2),
            ArrowTypeTag::Int32
            | ArrowTypeTag::UInt32
            | ArrowTypeTag::Float32
            | ArrowTypeTag::Date32 => Some(4),
            ArrowTypeTag::Int64
            | ArrowTypeTag::UInt64
            | ArrowTypeTag::Float64
            | ArrowTypeTag::Time64Micros
            | ArrowTypeTag::TimestampMicros { .. } => Some(8),
            ArrowTypeTag::Decimal128 { .. } => Some(16),
            ArrowTypeTag::Boolean
            | ArrowTypeTag::Utf8
            | ArrowTypeTag::Binary
            | ArrowTypeTag::Struct
            | ArrowTypeTag::List => None,
        }
    }

    /// Whether columns of this type track min/max statistics.
    pub fn has_stats(self) -> bool {
        match self {
            ArrowTypeTag::Int16
            | ArrowTypeTag::Int32
            | ArrowTypeTag::Int64
            | ArrowTypeTag::UInt8
            | ArrowTypeTag::UInt16
            | ArrowTypeTag::UInt32
            | ArrowTypeTag::UInt64
            | ArrowTypeTag::Float32
            | ArrowTypeTag::Float64
            | ArrowTypeTag::Date32
            | ArrowTypeTag::Time64Micros
            | ArrowTypeTag::TimestampMicros { .. } => true,
            ArrowTypeTag::Boolean
            | ArrowTypeTag::Decimal128 { .. }
            | ArrowTypeTag::Utf8
            | ArrowTypeTag::Binary
            | ArrowTypeTag::Struct
            | ArrowTypeTag::List => false,
        }
    }

    /// Whether the value buffer holds 32-bit offsets (variable-length and
    /// list types).
    pub fn has_offsets(self) -> bool {
        matches!(
            self,
            ArrowTypeTag::Utf8 | ArrowTypeTag::Binary | ArrowTypeTag::List
        )
    }
}

impl fmt::Display for ArrowTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrowTypeTag::Boolean => f.write_str("boolean"),
            ArrowTypeTag::Int16 => f.write_str("int16"),
            ArrowTypeTag::Int32 => f.write_str("int32"),
            ArrowTypeTag::Int64 => f.write_str("int64"),
            ArrowTypeTag::UInt8 => f.write_str("uint8"),
            ArrowTypeTag::UInt16 => f.write_str("uint16"),
            ArrowTypeTag::UInt32 => f.write_str("uint32"),
            ArrowTypeTag::UInt64 => f.write_str("uint64"),
            ArrowTypeTag::Float32 => f.write_str("float32"),
            ArrowTypeTag::Float64 => f.write_str("float64"),
            ArrowTypeTag::Decimal128 { precision, scale } => {
                write!(f, "decimal128({precision}, {scale})")
            }
            ArrowTypeTag::Date32 => f.write_str("date32"),
            ArrowTypeTag::Time64Micros => f.write_str("time64[us]"),
            ArrowTypeTag::TimestampMicros { utc: false } => f.write_str("timestamp[us]"),
            ArrowTypeTag::TimestampMicros { utc: true } => f.write_str("timestamp[us, UTC]"),
            ArrowTypeTag::Utf8 => f.write_str("utf8"),
            ArrowTypeTag::Binary => f.write_str("binary"),
            ArrowTypeTag::Struct => f.write_str("struct"),
            ArrowTypeTag::List => f.write_str("list"),
        }
    }
}
