//! Type binding: maps a resolved descriptor to its Arrow type and converts
//! binary cell payloads into the column's Arrow buffers.
//!
//! Dispatch is a `match` over the closed [`ArrowTypeTag`] set; there are no
//! per-descriptor function pointers.

use pgarrow_result::{Error, Result};

use crate::buffer::{ByteBuffer, ColumnBuffer};
use crate::descriptor::{ColumnAttrs, ColumnDescriptor, Nested};
use crate::stats::StatDatum;
use crate::types::{ArrowTypeTag, PG_CATALOG_NAMESPACE, TypeCategory};
use crate::wire::{self, POSTGRES_EPOCH_DAYS, POSTGRES_EPOCH_MICROS};

/// Largest precision a `Decimal128` can hold.
pub const DECIMAL128_MAX_PRECISION: u8 = 38;

/// Decode the `(precision, scale)` pair packed into a `numeric` type
/// modifier. Returns `None` when the modifier is absent or the pair does not
/// fit a `Decimal128`.
pub fn decimal_from_typmod(type_mod: i32) -> Option<(u8, i8)> {
    if type_mod < 4 {
        return None;
    }
    let packed = type_mod - 4;
    let precision = (packed >> 16) & 0xffff;
    let scale = ((packed & 0x7ff) ^ 1024) - 1024;
    if precision < 1 || precision > DECIMAL128_MAX_PRECISION as i32 || scale > precision {
        return None;
    }
    let scale = i8::try_from(scale).ok()?;
    Some((precision as u8, scale))
}

/// Pick the Arrow type for a column whose nested content is already built.
pub fn resolve_type_tag(attrs: &ColumnAttrs, nested: &Nested) -> Result<ArrowTypeTag> {
    match nested {
        Nested::Composite(_) => return Ok(ArrowTypeTag::Struct),
        Nested::Array(_) => return Ok(ArrowTypeTag::List),
        Nested::None => {}
    }
    if attrs.category == TypeCategory::Composite {
        return Err(Error::Internal(format!(
            "composite type '{}' resolved without its fields",
            attrs.type_name
        )));
    }

    if attrs.namespace == PG_CATALOG_NAMESPACE {
        let tag = match attrs.type_name.as_str() {
            "bool" => Some(ArrowTypeTag::Boolean),
            "int2" => Some(ArrowTypeTag::Int16),
            "int4" => Some(ArrowTypeTag::Int32),
            "int8" => Some(ArrowTypeTag::Int64),
            "float4" => Some(ArrowTypeTag::Float32),
            "float8" => Some(ArrowTypeTag::Float64),
            "date" => Some(ArrowTypeTag::Date32),
            "time" => Some(ArrowTypeTag::Time64Micros),
            "timestamp" => Some(ArrowTypeTag::TimestampMicros { utc: false }),
            "timestamptz" => Some(ArrowTypeTag::TimestampMicros { utc: true }),
            "text" | "varchar" | "bpchar" => Some(ArrowTypeTag::Utf8),
            "numeric" => decimal_from_typmod(attrs.type_mod)
                .map(|(precision, scale)| ArrowTypeTag::Decimal128 { precision, scale }),
            _ => None,
        };
        if let Some(tag) = tag {
            return Ok(tag);
        }
    }

    // Anything else is mirrored by its physical layout.
    match attrs.type_len {
        1 => Ok(ArrowTypeTag::UInt8),
        2 => Ok(ArrowTypeTag::UInt16),
        4 => Ok(ArrowTypeTag::UInt32),
        8 => Ok(ArrowTypeTag::UInt64),
        n if n > 0 || n == -1 => Ok(ArrowTypeTag::Binary),
        n => Err(Error::unsupported_type(
            &attrs.type_name,
            format!("storage length {n} has no binary layout"),
        )),
    }
}

/// Append the cell for `row` to `col` and return the column's aligned buffer
/// usage after the append, nested buffers included.
pub fn put_value(col: &mut ColumnDescriptor, row: usize, cell: Option<&[u8]>) -> Result<usize> {
    match col.type_tag {
        ArrowTypeTag::Boolean => put_bool(col, row, cell)?,
        ArrowTypeTag::Utf8 | ArrowTypeTag::Binary => put_variable(col, row, cell)?,
        ArrowTypeTag::Struct => put_composite(col, row, cell)?,
        ArrowTypeTag::List => put_list(col, row, cell)?,
        tag => put_fixed(col, tag, row, cell)?,
    }
    Ok(col.usage())
}

/// Fold a non-null cell into the column's running min/max. Types without
/// statistics are left alone.
pub fn stat_update(col: &mut ColumnDescriptor, cell: Option<&[u8]>) -> Result<()> {
    let Some(data) = cell else {
        return Ok(());
    };
    if !col.type_tag.has_stats() {
        return Ok(());
    }
    let datum = decode_stat(col.type_tag, &col.name, data)?;
    col.buffer.stats.update(datum);
    Ok(())
}

fn mark_null(buffer: &mut ColumnBuffer, row: usize) {
    buffer.null_count += 1;
    buffer.nullmap.clear_bit(row);
}

fn expect_len<'a>(column: &str, data: &'a [u8], width: usize) -> Result<&'a [u8]> {
    if data.len() != width {
        return Err(Error::wire_format(
            column,
            format!("expected {width} bytes, got {}", data.len()),
        ));
    }
    Ok(data)
}

fn be_array<const N: usize>(column: &str, data: &[u8]) -> Result<[u8; N]> {
    let data = expect_len(column, data, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(data);
    Ok(out)
}

fn put_bool(col: &mut ColumnDescriptor, row: usize, cell: Option<&[u8]>) -> Result<()> {
    let buffer = &mut col.buffer;
    match cell {
        None => {
            mark_null(buffer, row);
            buffer.values.clear_bit(row);
        }
        Some(data) => {
            let [byte] = be_array::<1>(&col.name, data)?;
            buffer.nullmap.set_bit(row);
            if byte != 0 {
                buffer.values.set_bit(row);
            } else {
                buffer.values.clear_bit(row);
            }
        }
    }
    Ok(())
}

fn put_fixed(
    col: &mut ColumnDescriptor,
    tag: ArrowTypeTag,
    row: usize,
    cell: Option<&[u8]>,
) -> Result<()> {
    let width = tag
        .fixed_width()
        .ok_or_else(|| Error::Internal(format!("{tag} is not a fixed-width type")))?;
    match cell {
        None => {
            mark_null(&mut col.buffer, row);
            col.buffer.values.append_zero(width);
        }
        Some(data) => {
            append_fixed(&mut col.buffer.values, tag, &col.name, data)?;
            col.buffer.nullmap.set_bit(row);
        }
    }
    Ok(())
}

/// Convert one big-endian payload into the little-endian Arrow value.
fn append_fixed(
    values: &mut ByteBuffer,
    tag: ArrowTypeTag,
    column: &str,
    data: &[u8],
) -> Result<()> {
    match tag {
        ArrowTypeTag::UInt8 => values.append(&be_array::<1>(column, data)?),
        ArrowTypeTag::Int16 | ArrowTypeTag::UInt16 => {
            values.append(&u16::from_be_bytes(be_array(column, data)?).to_le_bytes())
        }
        ArrowTypeTag::Int32 | ArrowTypeTag::UInt32 | ArrowTypeTag::Float32 => {
            values.append(&u32::from_be_bytes(be_array(column, data)?).to_le_bytes())
        }
        ArrowTypeTag::Int64
        | ArrowTypeTag::UInt64
        | ArrowTypeTag::Float64
        | ArrowTypeTag::Time64Micros => {
            values.append(&u64::from_be_bytes(be_array(column, data)?).to_le_bytes())
        }
        ArrowTypeTag::Date32 => {
            let days = i32::from_be_bytes(be_array(column, data)?);
            // +/-infinity stay pinned to the extremes
            values.append(&days.saturating_add(POSTGRES_EPOCH_DAYS).to_le_bytes())
        }
        ArrowTypeTag::TimestampMicros { .. } => {
            let micros = i64::from_be_bytes(be_array(column, data)?);
            values.append(&micros.saturating_add(POSTGRES_EPOCH_MICROS).to_le_bytes())
        }
        ArrowTypeTag::Decimal128 { precision, scale } => {
            let unscaled = wire::parse_numeric(column, data, precision, scale)?;
            values.append(&unscaled.to_le_bytes())
        }
        other => {
            return Err(Error::Internal(format!(
                "{other} has no fixed-width conversion"
            )));
        }
    }
    Ok(())
}

fn decode_stat(tag: ArrowTypeTag, column: &str, data: &[u8]) -> Result<StatDatum> {
    let datum = match tag {
        ArrowTypeTag::Int16 => StatDatum::Int(i16::from_be_bytes(be_array(column, data)?) as i64),
        ArrowTypeTag::Int32 => StatDatum::Int(i32::from_be_bytes(be_array(column, data)?) as i64),
        ArrowTypeTag::Int64 | ArrowTypeTag::Time64Micros => {
            StatDatum::Int(i64::from_be_bytes(be_array(column, data)?))
        }
        ArrowTypeTag::Date32 => {
            let days = i32::from_be_bytes(be_array(column, data)?);
            StatDatum::Int(days.saturating_add(POSTGRES_EPOCH_DAYS) as i64)
        }
        ArrowTypeTag::TimestampMicros { .. } => {
            let micros = i64::from_be_bytes(be_array(column, data)?);
            StatDatum::Int(micros.saturating_add(POSTGRES_EPOCH_MICROS))
        }
        ArrowTypeTag::UInt8 => StatDatum::UInt(be_array::<1>(column, data)?[0] as u64),
        ArrowTypeTag::UInt16 => StatDatum::UInt(u16::from_be_bytes(be_array(column, data)?) as u64),
        ArrowTypeTag::UInt32 => StatDatum::UInt(u32::from_be_bytes(be_array(column, data)?) as u64),
        ArrowTypeTag::UInt64 => StatDatum::UInt(u64::from_be_bytes(be_array(column, data)?)),
        ArrowTypeTag::Float32 => {
            StatDatum::Float(f32::from_be_bytes(be_array(column, data)?) as f64)
        }
        ArrowTypeTag::Float64 => StatDatum::Float(f64::from_be_bytes(be_array(column, data)?)),
        other => {
            return Err(Error::Internal(format!("{other} does not track statistics")));
        }
    };
    Ok(datum)
}

/// Push the next `i32` offset, seeding the leading zero on the first row.
fn push_offset(values: &mut ByteBuffer, column: &str, offset: usize) -> Result<()> {
    if values.is_empty() {
        values.append(&0i32.to_le_bytes());
    }
    let offset = i32::try_from(offset).map_err(|_| {
        Error::wire_format(column, format!("offset {offset} exceeds the 32-bit offset range"))
    })?;
    values.append(&offset.to_le_bytes());
    Ok(())
}

fn put_variable(col: &mut ColumnDescriptor, row: usize, cell: Option<&[u8]>) -> Result<()> {
    let buffer = &mut col.buffer;
    match cell {
        None => mark_null(buffer, row),
        Some(data) => {
            if col.type_tag == ArrowTypeTag::Utf8 && std::str::from_utf8(data).is_err() {
                return Err(Error::wire_format(&col.name, "text value is not valid UTF-8"));
            }
            buffer.nullmap.set_bit(row);
            buffer.extra.append(data);
        }
    }
    push_offset(&mut buffer.values, &col.name, buffer.extra.len())
}

fn put_composite(col: &mut ColumnDescriptor, row: usize, cell: Option<&[u8]>) -> Result<()> {
    let Nested::Composite(fields) = &mut col.nested else {
        return Err(Error::Internal(format!("struct column '{}' has no fields", col.name)));
    };
    let Some(data) = cell else {
        mark_null(&mut col.buffer, row);
        for field in fields.iter_mut() {
            put_value(field, row, None)?;
        }
        return Ok(());
    };

    let record = wire::parse_record(&col.name, data)?;
    if record.len() > fields.len() {
        return Err(Error::wire_format(
            &col.name,
            format!(
                "record has {} fields but type '{}' declares {}",
                record.len(),
                col.type_name,
                fields.len()
            ),
        ));
    }
    col.buffer.nullmap.set_bit(row);
    for (idx, field) in fields.iter_mut().enumerate() {
        match record.get(idx) {
            Some(value) => {
                if value.type_id != field.type_id {
                    return Err(Error::wire_format(
                        &col.name,
                        format!(
                            "field '{}' has type {} on the wire, expected {}",
                            field.name, value.type_id, field.type_id
                        ),
                    ));
                }
                put_value(field, row, value.value)?;
            }
            None => {
                put_value(field, row, None)?;
            }
        }
    }
    Ok(())
}

fn put_list(col: &mut ColumnDescriptor, row: usize, cell: Option<&[u8]>) -> Result<()> {
    let Nested::Array(element) = &mut col.nested else {
        return Err(Error::Internal(format!("list column '{}' has no element", col.name)));
    };
    let base = col.buffer.values.last_i32().unwrap_or(0).max(0) as usize;
    let Some(data) = cell else {
        mark_null(&mut col.buffer, row);
        return push_offset(&mut col.buffer.values, &col.name, base);
    };

    let array = wire::parse_array(&col.name, data)?;
    if !array.elements.is_empty() && array.element_type != element.type_id {
        return Err(Error::wire_format(
            &col.name,
            format!(
                "array element type {} on the wire, expected {}",
                array.element_type, element.type_id
            ),
        ));
    }
    for (k, value) in array.elements.iter().enumerate() {
        put_value(element, base + k, *value)?;
    }
    col.buffer.nullmap.set_bit(row);
    push_offset(&mut col.buffer.values, &col.name, base + array.elements.len())
}
