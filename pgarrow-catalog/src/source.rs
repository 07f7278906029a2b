use pgarrow_column::Oid;
use pgarrow_result::Result;

/// One row of catalog metadata, shaped like the join of `pg_attribute`,
/// `pg_type` and `pg_namespace`.
///
/// Type lookups fill `ordinal` with `0`, `name` with the type name and
/// `type_mod` with `-1`; composite field lookups carry the attribute values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogRow {
    pub ordinal: i32,
    pub name: String,
    pub type_id: Oid,
    pub type_mod: i32,
    pub type_len: i16,
    pub by_value: bool,
    /// Raw `typalign` code.
    pub align: char,
    /// Raw `typtype` code.
    pub category: char,
    /// `typrelid`: row-type relation of a composite, `0` otherwise.
    pub relation_id: Oid,
    /// `typelem`: element type of an array, `0` otherwise.
    pub element_id: Oid,
    pub namespace: String,
    pub type_name: String,
}

/// A column of the query result, as described by the row description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub type_id: Oid,
    pub type_mod: i32,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, type_id: Oid, type_mod: i32) -> Self {
        Self {
            name: name.into(),
            type_id,
            type_mod,
        }
    }
}

/// Catalog Metadata Source.
///
/// Implementations only run the lookups; the schema builder checks the
/// row-count contract of each call.
pub trait CatalogSource {
    /// Rows describing the type `type_id`. Exactly one is expected.
    fn type_rows(&mut self, type_id: Oid) -> Result<Vec<CatalogRow>>;

    /// One row per live field of the composite whose row type is
    /// `relation_id`, in any order.
    fn composite_rows(&mut self, relation_id: Oid) -> Result<Vec<CatalogRow>>;
}

impl<C: CatalogSource + ?Sized> CatalogSource for &mut C {
    fn type_rows(&mut self, type_id: Oid) -> Result<Vec<CatalogRow>> {
        (**self).type_rows(type_id)
    }

    fn composite_rows(&mut self, relation_id: Oid) -> Result<Vec<CatalogRow>> {
        (**self).composite_rows(relation_id)
    }
}
