//! Mapping of column descriptors onto Arrow fields.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use pgarrow_column::{ArrowTypeTag, ColumnDescriptor, ColumnStats, Nested};

/// Field metadata key holding per-batch minimums.
pub const MIN_VALUES_KEY: &str = "min_values";
/// Field metadata key holding per-batch maximums.
pub const MAX_VALUES_KEY: &str = "max_values";
/// Field metadata key recording the source type.
pub const PG_TYPE_KEY: &str = "pg_type";

/// Name of the child field of a list.
pub const LIST_ITEM_NAME: &str = "item";

pub fn data_type(column: &ColumnDescriptor) -> DataType {
    match column.type_tag {
        ArrowTypeTag::Boolean => DataType::Boolean,
        ArrowTypeTag::Int16 => DataType::Int16,
        ArrowTypeTag::Int32 => DataType::Int32,
        ArrowTypeTag::Int64 => DataType::Int64,
        ArrowTypeTag::UInt8 => DataType::UInt8,
        ArrowTypeTag::UInt16 => DataType::UInt16,
        ArrowTypeTag::UInt32 => DataType::UInt32,
        ArrowTypeTag::UInt64 => DataType::UInt64,
        ArrowTypeTag::Float32 => DataType::Float32,
        ArrowTypeTag::Float64 => DataType::Float64,
        ArrowTypeTag::Decimal128 { precision, scale } => DataType::Decimal128(precision, scale),
        ArrowTypeTag::Date32 => DataType::Date32,
        ArrowTypeTag::Time64Micros => DataType::Time64(TimeUnit::Microsecond),
        ArrowTypeTag::TimestampMicros { utc } => {
            DataType::Timestamp(TimeUnit::Microsecond, utc.then(|| "UTC".into()))
        }
        ArrowTypeTag::Utf8 => DataType::Utf8,
        ArrowTypeTag::Binary => DataType::Binary,
        ArrowTypeTag::Struct => {
            let fields: Fields = column.fields().iter().map(field).collect();
            DataType::Struct(fields)
        }
        ArrowTypeTag::List => match &column.nested {
            Nested::Array(element) => DataType::List(Arc::new(Field::new(
                LIST_ITEM_NAME,
                data_type(element),
                true,
            ))),
            // resolve_type_tag only yields List for arrays
            _ => DataType::Null,
        },
    }
}

/// Nullable field for `column`, tagged with its source type.
pub fn field(column: &ColumnDescriptor) -> Field {
    let metadata = HashMap::from([(
        PG_TYPE_KEY.to_string(),
        format!("{}.{}", column.namespace, column.type_name),
    )]);
    Field::new(&column.name, data_type(column), true).with_metadata(metadata)
}

pub fn schema(columns: &[ColumnDescriptor]) -> Schema {
    Schema::new(columns.iter().map(field).collect::<Vec<_>>())
}

/// Comma-separated per-batch values; a batch without a value contributes an
/// empty entry.
fn join_stats(stats: &[ColumnStats], pick: impl Fn(&ColumnStats) -> Option<String>) -> String {
    stats
        .iter()
        .map(|s| pick(s).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

/// The schema written to the file footer: `schema` plus min/max metadata for
/// every column that tracks statistics. `batch_stats[b][c]` holds column `c`
/// of batch `b`.
pub fn footer_schema(
    columns: &[ColumnDescriptor],
    schema: &Schema,
    batch_stats: &[Vec<ColumnStats>],
) -> Schema {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let tracks = columns.get(idx).is_some_and(|c| c.type_tag.has_stats());
            if !tracks || batch_stats.is_empty() {
                return f.as_ref().clone();
            }
            let per_batch: Vec<ColumnStats> = batch_stats
                .iter()
                .map(|b| b.get(idx).copied().unwrap_or_default())
                .collect();
            let mut metadata = f.metadata().clone();
            metadata.insert(
                MIN_VALUES_KEY.to_string(),
                join_stats(&per_batch, |s| s.min.map(|v| v.to_string())),
            );
            metadata.insert(
                MAX_VALUES_KEY.to_string(),
                join_stats(&per_batch, |s| s.max.map(|v| v.to_string())),
            );
            f.as_ref().clone().with_metadata(metadata)
        })
        .collect();
    Schema::new_with_metadata(fields, schema.metadata().clone())
}
