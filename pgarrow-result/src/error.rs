use std::{fmt, io};
use thiserror::Error;

/// Unified error type for every stage of a pg2arrow pass.
///
/// Every variant is fatal to the pass that raised it: schema resolution, row
/// ingestion and batch sealing never retry after an error, and the output file
/// is not guaranteed to be valid once one has been returned.
///
/// # Error Categories
///
/// - **Schema errors** ([`Error::UnknownAlignment`], [`Error::UnsupportedType`],
///   [`Error::OrdinalOutOfRange`], [`Error::DuplicateOrdinal`],
///   [`Error::UnexpectedRowCount`], [`Error::CatalogError`]): the catalog
///   describes something this tool cannot mirror.
/// - **Capacity errors** ([`Error::RowExceedsSegment`]): a single row does not
///   fit into an empty record batch.
/// - **Precondition errors** ([`Error::NonBinaryFormat`],
///   [`Error::ColumnCountMismatch`], [`Error::WireFormat`]): a collaborator
///   broke its contract.
/// - **Infrastructure errors** ([`Error::Io`], [`Error::Arrow`],
///   [`Error::Source`]).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while writing the output file or reading a query file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow library error while assembling arrays or encoding IPC messages.
    ///
    /// Buffers handed to Arrow are validated when the array data is built, so
    /// this variant also surfaces inconsistent buffer layouts.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error reported by the data source (connection, query, fetch).
    #[error("source error: {0}")]
    Source(String),

    /// Invalid user input or API parameter, such as a malformed segment size.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// A catalog query returned something structurally unexpected.
    #[error("catalog error: {0}")]
    CatalogError(String),

    /// `typalign` was not one of `c`, `s`, `i`, `d`.
    #[error("unknown alignment code '{code}' for type '{type_name}'")]
    UnknownAlignment { type_name: String, code: char },

    /// The type category (or the physical layout) cannot be mirrored.
    ///
    /// Domains, enums, pseudo types and ranges are rejected outright; there is
    /// no silent fallback to a textual or binary representation.
    #[error("unsupported type '{type_name}': {reason}")]
    UnsupportedType { type_name: String, reason: String },

    /// A composite field reported an ordinal outside `[1, field_count]`.
    #[error("attribute number {ordinal} of relation {relation_id} is out of range 1..={field_count}")]
    OrdinalOutOfRange {
        relation_id: u32,
        ordinal: i32,
        field_count: usize,
    },

    /// Two composite fields reported the same ordinal.
    #[error("attribute number {ordinal} of relation {relation_id} appears more than once")]
    DuplicateOrdinal { relation_id: u32, ordinal: i32 },

    /// A by-identifier catalog lookup did not return exactly one row.
    #[error("unexpected number of catalog rows for type {type_id}: {rows}")]
    UnexpectedRowCount { type_id: u32, rows: usize },

    /// A single row is larger than the segment size even in an empty batch.
    #[error("a result row needs {usage} bytes, larger than the record batch segment size of {segment_size} bytes")]
    RowExceedsSegment { usage: usize, segment_size: usize },

    /// A result field was delivered in text format.
    #[error("column '{column}' is not in binary wire format")]
    NonBinaryFormat { column: String },

    /// A page's column count disagrees with the resolved schema.
    #[error("result page has {actual} columns but the schema has {expected}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    /// A binary payload does not match the layout of its type.
    #[error("malformed binary value in column '{column}': {message}")]
    WireFormat { column: String, message: String },

    /// Internal error indicating a bug or unexpected state.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a source error from any displayable error, typically a client
    /// library error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgarrow_result::Error;
    ///
    /// let io_err = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
    /// let err = Error::source(io_err);
    /// assert!(matches!(err, Error::Source(msg) if msg.contains("connection reset")));
    /// ```
    #[inline]
    pub fn source<E: fmt::Display>(err: E) -> Self {
        Error::Source(err.to_string())
    }

    /// Create a wire-format error for the named column.
    #[inline]
    pub fn wire_format(column: impl Into<String>, message: impl Into<String>) -> Self {
        Error::WireFormat {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-type error.
    #[inline]
    pub fn unsupported_type(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
