use std::fmt;

use pgarrow_column::{ColumnDescriptor, Nested};

/// Human-readable tree of resolved columns, one line per descriptor.
pub struct SchemaDump<'a>(pub &'a [ColumnDescriptor]);

fn write_column(
    f: &mut fmt::Formatter<'_>,
    column: &ColumnDescriptor,
    label: &str,
    indent: usize,
) -> fmt::Result {
    writeln!(
        f,
        "{:indent$}{label} {{name='{}', type={}.{} (oid {}), typmod={}, typlen={}, byval={}, align={}, category={}, arrow={}}}",
        "",
        column.name,
        column.namespace,
        column.type_name,
        column.type_id,
        column.type_mod,
        column.type_len,
        column.by_value,
        column.alignment.code(),
        column.category.code(),
        column.type_tag,
    )?;
    match &column.nested {
        Nested::None => Ok(()),
        Nested::Array(element) => write_column(f, element, "element", indent + 2),
        Nested::Composite(fields) => {
            for (idx, field) in fields.iter().enumerate() {
                write_column(f, field, &format!("field[{idx}]"), indent + 2)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for SchemaDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "columns: {}", self.0.len())?;
        for (idx, column) in self.0.iter().enumerate() {
            write_column(f, column, &format!("column[{idx}]"), 0)?;
        }
        Ok(())
    }
}
