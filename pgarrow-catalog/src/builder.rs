//! Recursive schema resolution.
//!
//! Walks catalog metadata from the result columns down through composite
//! fields and array elements, producing one owned [`ColumnDescriptor`] tree
//! per result column.

use pgarrow_column::{
    Alignment, ColumnAttrs, ColumnDescriptor, INVALID_OID, Nested, Oid, TypeCategory,
};
use pgarrow_result::{Error, Result};

use crate::source::{CatalogRow, CatalogSource, ResultColumn};

/// Field-node and physical-buffer counts of a resolved schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaTotals {
    pub field_nodes: usize,
    pub buffers: usize,
}

/// Descriptors for every result column plus their aggregated totals.
#[derive(Clone, Debug)]
pub struct ResolvedSchema {
    pub columns: Vec<ColumnDescriptor>,
    pub totals: SchemaTotals,
}

fn category_name(code: char) -> &'static str {
    match code {
        'd' => "domain",
        'e' => "enum",
        'p' => "pseudo",
        'r' => "range",
        'm' => "multirange",
        _ => "unknown",
    }
}

/// Schema Tree Builder over a [`CatalogSource`].
pub struct SchemaBuilder<'a, C: CatalogSource + ?Sized> {
    catalog: &'a mut C,
}

impl<'a, C: CatalogSource + ?Sized> SchemaBuilder<'a, C> {
    pub fn new(catalog: &'a mut C) -> Self {
        Self { catalog }
    }

    /// Resolve every result column in order.
    pub fn build(&mut self, columns: &[ResultColumn]) -> Result<ResolvedSchema> {
        let mut totals = SchemaTotals::default();
        let mut resolved = Vec::with_capacity(columns.len());
        for column in columns {
            resolved.push(self.resolve_result_column(column, &mut totals)?);
        }
        tracing::debug!(
            "[SCHEMA] resolved {} columns, {} field nodes, {} buffers",
            resolved.len(),
            totals.field_nodes,
            totals.buffers
        );
        Ok(ResolvedSchema {
            columns: resolved,
            totals,
        })
    }

    /// Resolve one top-level column through a by-id type lookup. The column
    /// keeps the result's name and type modifier.
    pub fn resolve_result_column(
        &mut self,
        column: &ResultColumn,
        totals: &mut SchemaTotals,
    ) -> Result<ColumnDescriptor> {
        let ty = self.lookup_type(column.type_id)?;
        let row = CatalogRow {
            name: column.name.clone(),
            type_mod: column.type_mod,
            ..ty
        };
        self.resolve_column(&row, totals)
    }

    /// Build the descriptor for one catalog row, recursing into composite
    /// fields and array elements, and add its own field node and buffers to
    /// `totals`.
    pub fn resolve_column(
        &mut self,
        row: &CatalogRow,
        totals: &mut SchemaTotals,
    ) -> Result<ColumnDescriptor> {
        let alignment = Alignment::from_code(row.align).ok_or_else(|| Error::UnknownAlignment {
            type_name: row.type_name.clone(),
            code: row.align,
        })?;
        let category = TypeCategory::from_code(row.category).ok_or_else(|| {
            Error::unsupported_type(
                &row.type_name,
                format!(
                    "type category '{}' ({}) is not supported",
                    row.category,
                    category_name(row.category)
                ),
            )
        })?;

        let nested = match category {
            TypeCategory::Base if row.element_id != INVALID_OID && row.type_len == -1 => {
                Nested::Array(Box::new(self.resolve_array_element(row.element_id)?))
            }
            TypeCategory::Base => Nested::None,
            TypeCategory::Composite => {
                Nested::Composite(self.resolve_composite(row.relation_id, &row.type_name, totals)?)
            }
        };

        let attrs = ColumnAttrs {
            name: row.name.clone(),
            type_id: row.type_id,
            type_mod: row.type_mod,
            type_len: row.type_len,
            by_value: row.by_value,
            alignment,
            category,
            namespace: row.namespace.clone(),
            type_name: row.type_name.clone(),
        };
        let column = ColumnDescriptor::new(attrs, nested)?;
        totals.buffers += column.buffer_count();
        totals.field_nodes += 1;
        tracing::trace!(
            "[SCHEMA] {} {}.{} (oid {}) -> {}",
            column.name,
            column.namespace,
            column.type_name,
            column.type_id,
            column.type_tag
        );
        Ok(column)
    }

    /// Resolve the fields of a composite, placing each at `ordinal - 1`.
    fn resolve_composite(
        &mut self,
        relation_id: Oid,
        type_name: &str,
        totals: &mut SchemaTotals,
    ) -> Result<Vec<ColumnDescriptor>> {
        if relation_id == INVALID_OID {
            return Err(Error::CatalogError(format!(
                "composite type '{type_name}' has no row-type relation"
            )));
        }
        let rows = self.catalog.composite_rows(relation_id)?;
        let field_count = rows.len();
        let mut slots: Vec<Option<ColumnDescriptor>> = (0..field_count).map(|_| None).collect();
        for row in &rows {
            if row.ordinal < 1 || row.ordinal as usize > field_count {
                return Err(Error::OrdinalOutOfRange {
                    relation_id,
                    ordinal: row.ordinal,
                    field_count,
                });
            }
            let slot = &mut slots[row.ordinal as usize - 1];
            if slot.is_some() {
                return Err(Error::DuplicateOrdinal {
                    relation_id,
                    ordinal: row.ordinal,
                });
            }
            *slot = Some(self.resolve_column(row, totals)?);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| {
                    Error::Internal(format!(
                        "attribute {} of relation {relation_id} was not resolved",
                        idx + 1
                    ))
                })
            })
            .collect()
    }

    /// Resolve an array's element type. Its counts stay out of the caller's
    /// totals.
    pub fn resolve_array_element(&mut self, element_id: Oid) -> Result<ColumnDescriptor> {
        let row = self.lookup_type(element_id)?;
        let mut scratch = SchemaTotals::default();
        self.resolve_column(&row, &mut scratch)
    }

    fn lookup_type(&mut self, type_id: Oid) -> Result<CatalogRow> {
        let mut rows = self.catalog.type_rows(type_id)?;
        if rows.len() != 1 {
            return Err(Error::UnexpectedRowCount {
                type_id,
                rows: rows.len(),
            });
        }
        Ok(rows.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemCatalog;
    use pgarrow_column::ArrowTypeTag;

    #[test]
    fn scalar_columns_keep_result_name_and_typmod() {
        let mut catalog = MemCatalog::with_builtin_types();
        let mut builder = SchemaBuilder::new(&mut catalog);
        let numeric_10_2 = (10 << 16 | 2) + 4;
        let schema = builder
            .build(&[
                ResultColumn::new("id", 23, -1),
                ResultColumn::new("price", 1700, numeric_10_2),
            ])
            .unwrap();
        assert_eq!(schema.columns[0].name, "id");
        assert_eq!(
            schema.columns[1].type_tag,
            ArrowTypeTag::Decimal128 {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(
            schema.totals,
            SchemaTotals {
                field_nodes: 2,
                buffers: 4
            }
        );
    }

    #[test]
    fn missing_type_is_an_unexpected_row_count() {
        let mut catalog = MemCatalog::with_builtin_types();
        let err = SchemaBuilder::new(&mut catalog)
            .build(&[ResultColumn::new("x", 99_999, -1)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedRowCount {
                type_id: 99_999,
                rows: 0
            }
        ));
    }

    #[test]
    fn fixed_length_types_with_typelem_are_not_arrays() {
        let mut catalog = MemCatalog::with_builtin_types();
        let schema = SchemaBuilder::new(&mut catalog)
            .build(&[ResultColumn::new("p", 600, -1)])
            .unwrap();
        assert!(matches!(schema.columns[0].nested, Nested::None));
        assert_eq!(schema.columns[0].type_tag, ArrowTypeTag::Binary);
    }
}
