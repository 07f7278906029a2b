//! Arrow IPC output for sealed batches.
//!
//! [`ArrowFileWriter`] implements [`pgarrow_table::BatchEncoder`]: every
//! sealed batch becomes one record-batch message, and the footer written by
//! [`ArrowFileWriter::finish`] lists the batches together with per-batch
//! min/max statistics in the field metadata.

pub mod array;
pub mod dump;
pub mod schema;
pub mod writer;

pub use array::{array_data, column_array};
pub use dump::dump_arrow_file;
pub use schema::{MAX_VALUES_KEY, MIN_VALUES_KEY, PG_TYPE_KEY, data_type, field, footer_schema};
pub use writer::{ARROW_MAGIC, ArrowFileWriter};
