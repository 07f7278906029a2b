//! Conversion of column buffers into Arrow arrays.
//!
//! Buffers may hold bytes past the batch's row count (the row that triggered
//! sealing), so every buffer is cut to exactly `rows` entries here.

use arrow::array::{ArrayData, ArrayRef, make_array};
use arrow::buffer::Buffer;
use pgarrow_column::{ArrowTypeTag, ColumnDescriptor, Nested};
use pgarrow_result::{Error, Result};

use crate::schema::data_type;

fn prefix<'a>(
    column: &ColumnDescriptor,
    bytes: &'a [u8],
    len: usize,
    what: &str,
) -> Result<&'a [u8]> {
    bytes.get(..len).ok_or_else(|| {
        Error::Internal(format!(
            "{what} buffer of '{}' holds {} bytes, {len} needed",
            column.name,
            bytes.len()
        ))
    })
}

/// Offset stored at position `rows`, the end of the last sealed row.
fn end_offset(column: &ColumnDescriptor, rows: usize) -> Result<usize> {
    let offset = column.buffer.values().i32_at(rows).ok_or_else(|| {
        Error::Internal(format!("'{}' has no offset for row {rows}", column.name))
    })?;
    usize::try_from(offset)
        .map_err(|_| Error::Internal(format!("'{}' has a negative offset", column.name)))
}

pub fn array_data(column: &ColumnDescriptor, rows: usize) -> Result<ArrayData> {
    let buffer = &column.buffer;
    let mut builder = ArrayData::builder(data_type(column)).len(rows);
    if buffer.null_count() > 0 {
        let bits = prefix(column, buffer.nullmap().as_slice(), rows.div_ceil(8), "validity")?;
        builder = builder.null_bit_buffer(Some(Buffer::from_slice_ref(bits)));
    }

    builder = match column.type_tag {
        ArrowTypeTag::Boolean => {
            let bits = prefix(column, buffer.values().as_slice(), rows.div_ceil(8), "value")?;
            builder.add_buffer(Buffer::from_slice_ref(bits))
        }
        ArrowTypeTag::Utf8 | ArrowTypeTag::Binary => {
            let offsets = prefix(column, buffer.values().as_slice(), (rows + 1) * 4, "offset")?;
            let end = end_offset(column, rows)?;
            let payload = prefix(column, buffer.extra().as_slice(), end, "payload")?;
            builder
                .add_buffer(Buffer::from_slice_ref(offsets))
                .add_buffer(Buffer::from_slice_ref(payload))
        }
        ArrowTypeTag::Struct => {
            let children = column
                .fields()
                .iter()
                .map(|f| array_data(f, rows))
                .collect::<Result<Vec<_>>>()?;
            builder.child_data(children)
        }
        ArrowTypeTag::List => {
            let Nested::Array(element) = &column.nested else {
                return Err(Error::Internal(format!("list '{}' has no element", column.name)));
            };
            let offsets = prefix(column, buffer.values().as_slice(), (rows + 1) * 4, "offset")?;
            let end = end_offset(column, rows)?;
            builder
                .add_buffer(Buffer::from_slice_ref(offsets))
                .add_child_data(array_data(element, end)?)
        }
        tag => {
            let width = tag
                .fixed_width()
                .ok_or_else(|| Error::Internal(format!("{tag} has no fixed width")))?;
            let values = prefix(column, buffer.values().as_slice(), rows * width, "value")?;
            builder.add_buffer(Buffer::from_slice_ref(values))
        }
    };
    Ok(builder.build()?)
}

/// Arrow array holding the first `rows` rows of `column`.
pub fn column_array(column: &ColumnDescriptor, rows: usize) -> Result<ArrayRef> {
    Ok(make_array(array_data(column, rows)?))
}
