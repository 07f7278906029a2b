//! PostgreSQL adapters: the catalog source and the binary row source.

use std::error::Error as StdError;

use pgarrow_catalog::{CatalogRow, CatalogSource, ResultColumn};
use pgarrow_column::Oid;
use pgarrow_result::{Error, Result};
use pgarrow_table::OwnedRowPage;
use postgres::types::{FromSql, Type};
use postgres::{GenericClient, Row, Statement};

/// Rows fetched from the portal per round trip.
pub const FETCH_ROWS: i32 = 500_000;

const TYPE_QUERY: &str = "\
SELECT 0::int4, t.typname::text, t.oid, (-1)::int4, t.typlen, t.typbyval,
       t.typalign, t.typtype, t.typrelid, t.typelem, n.nspname::text, t.typname::text
  FROM pg_catalog.pg_type t
  JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
 WHERE t.oid = $1";

const COMPOSITE_QUERY: &str = "\
SELECT (row_number() OVER (ORDER BY a.attnum))::int4, a.attname::text, a.atttypid,
       a.atttypmod, t.typlen, t.typbyval, t.typalign, t.typtype, t.typrelid,
       t.typelem, n.nspname::text, t.typname::text
  FROM pg_catalog.pg_attribute a
  JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
  JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
 WHERE a.attrelid = $1 AND a.attnum > 0 AND NOT a.attisdropped";

const TYPMOD_QUERY: &str = "\
SELECT a.atttypmod
  FROM pg_catalog.pg_attribute a
 WHERE a.attrelid = $1 AND a.attnum = $2";

/// `"char"` columns arrive as a single signed byte.
fn char_code(raw: i8) -> char {
    raw as u8 as char
}

fn catalog_row(row: &Row) -> Result<CatalogRow> {
    Ok(CatalogRow {
        ordinal: row.try_get(0).map_err(Error::source)?,
        name: row.try_get(1).map_err(Error::source)?,
        type_id: row.try_get(2).map_err(Error::source)?,
        type_mod: row.try_get(3).map_err(Error::source)?,
        type_len: row.try_get(4).map_err(Error::source)?,
        by_value: row.try_get(5).map_err(Error::source)?,
        align: char_code(row.try_get(6).map_err(Error::source)?),
        category: char_code(row.try_get(7).map_err(Error::source)?),
        relation_id: row.try_get(8).map_err(Error::source)?,
        element_id: row.try_get(9).map_err(Error::source)?,
        namespace: row.try_get(10).map_err(Error::source)?,
        type_name: row.try_get(11).map_err(Error::source)?,
    })
}

/// Catalog source running parameterized queries on a live connection.
pub struct PgCatalog<'a, C: GenericClient> {
    client: &'a mut C,
}

impl<'a, C: GenericClient> PgCatalog<'a, C> {
    pub fn new(client: &'a mut C) -> Self {
        Self { client }
    }

    /// Result columns of a prepared statement.
    ///
    /// The row description does not carry type modifiers through this
    /// client, so columns that come straight from a table read theirs from
    /// `pg_attribute`; computed columns get `-1`.
    pub fn result_columns(&mut self, statement: &Statement) -> Result<Vec<ResultColumn>> {
        statement
            .columns()
            .iter()
            .map(|column| {
                let type_mod = match (column.table_oid(), column.column_id()) {
                    (Some(table), Some(attnum)) => self.attribute_type_mod(table, attnum)?,
                    _ => -1,
                };
                Ok(ResultColumn::new(column.name(), column.type_().oid(), type_mod))
            })
            .collect()
    }

    fn attribute_type_mod(&mut self, table: Oid, attnum: i16) -> Result<i32> {
        let rows = self
            .client
            .query(TYPMOD_QUERY, &[&table, &attnum])
            .map_err(Error::source)?;
        match rows.first() {
            Some(row) => row.try_get(0).map_err(Error::source),
            None => Ok(-1),
        }
    }
}

impl<C: GenericClient> CatalogSource for PgCatalog<'_, C> {
    fn type_rows(&mut self, type_id: Oid) -> Result<Vec<CatalogRow>> {
        let rows = self
            .client
            .query(TYPE_QUERY, &[&type_id])
            .map_err(Error::source)?;
        rows.iter().map(catalog_row).collect()
    }

    fn composite_rows(&mut self, relation_id: Oid) -> Result<Vec<CatalogRow>> {
        let rows = self
            .client
            .query(COMPOSITE_QUERY, &[&relation_id])
            .map_err(Error::source)?;
        rows.iter().map(catalog_row).collect()
    }
}

type BoxError = Box<dyn StdError + Sync + Send>;

/// The binary send payload of one field, whatever its type.
pub struct RawCell<'a>(pub Option<&'a [u8]>);

impl<'a> FromSql<'a> for RawCell<'a> {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(RawCell(Some(raw)))
    }

    fn from_sql_null(_: &Type) -> std::result::Result<Self, BoxError> {
        Ok(RawCell(None))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// Copy fetched rows into a page of binary cells.
pub fn rows_to_page(rows: &[Row], num_fields: usize) -> Result<OwnedRowPage> {
    let mut page = OwnedRowPage::new(num_fields);
    for row in rows {
        let cells = (0..row.len())
            .map(|idx| {
                row.try_get::<_, RawCell>(idx)
                    .map(|cell| cell.0.map(<[u8]>::to_vec))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::source)?;
        page.push_row(cells)?;
    }
    Ok(page)
}
