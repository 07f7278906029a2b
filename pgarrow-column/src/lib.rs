//! Column descriptors, their per-batch buffers and the binding of source
//! types onto Arrow types.
//!
//! A [`ColumnDescriptor`] tree mirrors one result column, including nested
//! composite fields and array elements. [`binding::put_value`] appends a
//! binary cell into the tree's [`ColumnBuffer`]s and reports the aligned
//! usage the encoder will need for them.

pub mod binding;
pub mod buffer;
pub mod descriptor;
pub mod stats;
pub mod types;
pub mod wire;

pub use binding::{put_value, resolve_type_tag, stat_update};
pub use buffer::{ByteBuffer, ColumnBuffer};
pub use descriptor::{ColumnAttrs, ColumnDescriptor, Nested};
pub use pgarrow_result::{Error, Result};
pub use stats::{ColumnStats, StatDatum};
pub use types::{
    ARROW_ALIGNMENT, Alignment, ArrowTypeTag, INVALID_OID, Oid, PG_CATALOG_NAMESPACE,
    TypeCategory, arrow_align,
};
