//! Table buffer: the row ingestion engine and batch sealing.
//!
//! [`TableBuffer::append_page`] feeds result rows into the column buffers of
//! a resolved schema. Whenever the aligned usage of a row would exceed the
//! configured segment size, the rows accumulated so far are sealed into one
//! record batch through a [`BatchEncoder`] and ingestion continues with the
//! same row in an empty batch.

pub mod config;
pub mod encoder;
pub mod page;
pub mod table;

pub use config::{DEFAULT_SEGMENT_SIZE, TableBufferConfig, parse_segment_size};
pub use encoder::{BatchBlock, BatchEncoder, BatchSnapshot, EncodedBatch, MemEncoder};
pub use page::{OwnedRowPage, RowPage, WireFormat};
pub use pgarrow_result::{Error, Result};
pub use table::TableBuffer;
