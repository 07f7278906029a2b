//! Catalog access and schema resolution.
//!
//! [`SchemaBuilder`] turns the result columns of a query into a tree of
//! [`pgarrow_column::ColumnDescriptor`]s by querying a [`CatalogSource`].
//! [`MemCatalog`] is the in-memory source; the binary provides one backed by
//! a live PostgreSQL connection.

pub mod builder;
pub mod dump;
pub mod mem;
pub mod source;

pub use builder::{ResolvedSchema, SchemaBuilder, SchemaTotals};
pub use dump::SchemaDump;
pub use mem::{FIRST_NORMAL_OID, MemCatalog};
pub use source::{CatalogRow, CatalogSource, ResultColumn};
