//! In-memory catalog seeded with the built-in PostgreSQL types.

use pgarrow_column::{INVALID_OID, Oid, PG_CATALOG_NAMESPACE};
use pgarrow_result::{Error, Result};
use rustc_hash::FxHashMap;

use crate::source::{CatalogRow, CatalogSource};

/// First OID handed out to user-defined objects.
pub const FIRST_NORMAL_OID: Oid = 16_384;

/// `(oid, typname, typlen, typbyval, typalign, typtype, typelem)`
type BuiltinType = (Oid, &'static str, i16, bool, char, char, Oid);

const BUILTIN_TYPES: &[BuiltinType] = &[
    (16, "bool", 1, true, 'c', 'b', 0),
    (17, "bytea", -1, false, 'i', 'b', 0),
    (18, "char", 1, true, 'c', 'b', 0),
    (19, "name", 64, false, 'c', 'b', 18),
    (20, "int8", 8, true, 'd', 'b', 0),
    (21, "int2", 2, true, 's', 'b', 0),
    (23, "int4", 4, true, 'i', 'b', 0),
    (25, "text", -1, false, 'i', 'b', 0),
    (26, "oid", 4, true, 'i', 'b', 0),
    (600, "point", 16, false, 'd', 'b', 701),
    (700, "float4", 4, true, 'i', 'b', 0),
    (701, "float8", 8, true, 'd', 'b', 0),
    (1042, "bpchar", -1, false, 'i', 'b', 0),
    (1043, "varchar", -1, false, 'i', 'b', 0),
    (1082, "date", 4, true, 'i', 'b', 0),
    (1083, "time", 8, true, 'd', 'b', 0),
    (1114, "timestamp", 8, true, 'd', 'b', 0),
    (1184, "timestamptz", 8, true, 'd', 'b', 0),
    (1700, "numeric", -1, false, 'i', 'b', 0),
    (2249, "record", -1, false, 'd', 'p', 0),
    (2275, "cstring", -2, false, 'c', 'p', 0),
    (2950, "uuid", 16, false, 'c', 'b', 0),
    (3802, "jsonb", -1, false, 'i', 'b', 0),
    (1000, "_bool", -1, false, 'i', 'b', 16),
    (1001, "_bytea", -1, false, 'i', 'b', 17),
    (1005, "_int2", -1, false, 'i', 'b', 21),
    (1007, "_int4", -1, false, 'i', 'b', 23),
    (1009, "_text", -1, false, 'i', 'b', 25),
    (1014, "_bpchar", -1, false, 'i', 'b', 1042),
    (1015, "_varchar", -1, false, 'i', 'b', 1043),
    (1016, "_int8", -1, false, 'd', 'b', 20),
    (1021, "_float4", -1, false, 'i', 'b', 700),
    (1022, "_float8", -1, false, 'd', 'b', 701),
    (1115, "_timestamp", -1, false, 'd', 'b', 1114),
    (1182, "_date", -1, false, 'i', 'b', 1082),
    (1185, "_timestamptz", -1, false, 'd', 'b', 1184),
    (1231, "_numeric", -1, false, 'i', 'b', 1700),
    (2951, "_uuid", -1, false, 'i', 'b', 2950),
];

/// Catalog held in hash maps, used by tests and offline tooling.
#[derive(Clone, Debug)]
pub struct MemCatalog {
    types: FxHashMap<Oid, CatalogRow>,
    relations: FxHashMap<Oid, Vec<CatalogRow>>,
    next_oid: Oid,
}

impl Default for MemCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self {
            types: FxHashMap::default(),
            relations: FxHashMap::default(),
            next_oid: FIRST_NORMAL_OID,
        }
    }

    /// A catalog holding the common `pg_catalog` types and their arrays.
    pub fn with_builtin_types() -> Self {
        let mut catalog = Self::new();
        for &(oid, name, len, by_value, align, category, element) in BUILTIN_TYPES {
            catalog.insert_type(CatalogRow {
                ordinal: 0,
                name: name.to_string(),
                type_id: oid,
                type_mod: -1,
                type_len: len,
                by_value,
                align,
                category,
                relation_id: INVALID_OID,
                element_id: element,
                namespace: PG_CATALOG_NAMESPACE.to_string(),
                type_name: name.to_string(),
            });
        }
        catalog
    }

    pub fn insert_type(&mut self, row: CatalogRow) {
        self.types.insert(row.type_id, row);
    }

    /// Register the field rows of a composite's row-type relation as given.
    pub fn insert_relation(&mut self, relation_id: Oid, fields: Vec<CatalogRow>) {
        self.relations.insert(relation_id, fields);
    }

    pub fn type_row(&self, type_id: Oid) -> Option<&CatalogRow> {
        self.types.get(&type_id)
    }

    fn alloc_oid(&mut self) -> Oid {
        let oid = self.next_oid;
        self.next_oid += 1;
        oid
    }

    /// Define a composite type in `namespace` whose fields reference already
    /// registered types. Returns the new type's OID.
    pub fn create_composite(
        &mut self,
        namespace: &str,
        name: &str,
        fields: &[(&str, Oid)],
    ) -> Result<Oid> {
        let mut rows = Vec::with_capacity(fields.len());
        for (idx, &(field_name, type_id)) in fields.iter().enumerate() {
            let ty = self.types.get(&type_id).ok_or_else(|| {
                Error::CatalogError(format!(
                    "field '{field_name}' of '{name}' references unknown type {type_id}"
                ))
            })?;
            rows.push(CatalogRow {
                ordinal: idx as i32 + 1,
                name: field_name.to_string(),
                type_mod: -1,
                ..ty.clone()
            });
        }

        let type_id = self.alloc_oid();
        let relation_id = self.alloc_oid();
        self.insert_type(CatalogRow {
            ordinal: 0,
            name: name.to_string(),
            type_id,
            type_mod: -1,
            type_len: -1,
            by_value: false,
            align: 'd',
            category: 'c',
            relation_id,
            element_id: INVALID_OID,
            namespace: namespace.to_string(),
            type_name: name.to_string(),
        });
        self.insert_relation(relation_id, rows);
        Ok(type_id)
    }

    /// Define the array type over `element_id`. Returns the array's OID.
    pub fn create_array(&mut self, element_id: Oid) -> Result<Oid> {
        let element = self.types.get(&element_id).ok_or_else(|| {
            Error::CatalogError(format!("array over unknown element type {element_id}"))
        })?;
        let type_name = format!("_{}", element.type_name);
        let namespace = element.namespace.clone();
        let align = if element.align == 'd' { 'd' } else { 'i' };

        let type_id = self.alloc_oid();
        self.insert_type(CatalogRow {
            ordinal: 0,
            name: type_name.clone(),
            type_id,
            type_mod: -1,
            type_len: -1,
            by_value: false,
            align,
            category: 'b',
            relation_id: INVALID_OID,
            element_id,
            namespace,
            type_name,
        });
        Ok(type_id)
    }
}

impl CatalogSource for MemCatalog {
    fn type_rows(&mut self, type_id: Oid) -> Result<Vec<CatalogRow>> {
        Ok(self.types.get(&type_id).cloned().into_iter().collect())
    }

    fn composite_rows(&mut self, relation_id: Oid) -> Result<Vec<CatalogRow>> {
        Ok(self.relations.get(&relation_id).cloned().unwrap_or_default())
    }
}
