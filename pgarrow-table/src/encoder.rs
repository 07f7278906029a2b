//! The seam between batch sealing and the output container.

use pgarrow_column::{ColumnStats, arrow_align};
use pgarrow_result::Result;

use crate::table::TableBuffer;

/// Lengths of one encoded record-batch message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedBatch {
    pub metadata_len: usize,
    pub body_len: usize,
}

/// Location and summary of one sealed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchBlock {
    /// Output position of the batch's message.
    pub offset: u64,
    pub metadata_len: usize,
    pub body_len: usize,
    pub rows: usize,
    /// Min/max of each top-level column at the time of sealing.
    pub stats: Vec<ColumnStats>,
}

/// Writes sealed batches to the output.
///
/// `position` is read before each batch and only advanced by `write_batch`.
pub trait BatchEncoder {
    fn position(&self) -> u64;

    /// Encode the first `table.nitems()` rows of every column buffer.
    fn write_batch(&mut self, table: &TableBuffer) -> Result<EncodedBatch>;
}

impl<E: BatchEncoder + ?Sized> BatchEncoder for &mut E {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn write_batch(&mut self, table: &TableBuffer) -> Result<EncodedBatch> {
        (**self).write_batch(table)
    }
}

/// What [`MemEncoder`] saw of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSnapshot {
    pub rows: usize,
    pub null_counts: Vec<usize>,
    pub usage: usize,
}

/// In-memory encoder used for tests and dry runs. Records a snapshot of each
/// batch and advances its position by a nominal message size.
#[derive(Debug, Clone, Default)]
pub struct MemEncoder {
    position: u64,
    batches: Vec<BatchSnapshot>,
}

impl MemEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[BatchSnapshot] {
        &self.batches
    }
}

impl BatchEncoder for MemEncoder {
    fn position(&self) -> u64 {
        self.position
    }

    fn write_batch(&mut self, table: &TableBuffer) -> Result<EncodedBatch> {
        let snapshot = BatchSnapshot {
            rows: table.nitems(),
            null_counts: table
                .columns()
                .iter()
                .map(|c| c.buffer.null_count())
                .collect(),
            usage: table.columns().iter().map(|c| c.usage()).sum(),
        };
        let encoded = EncodedBatch {
            metadata_len: arrow_align(16 * (table.num_field_nodes() + table.num_buffers())),
            body_len: snapshot.usage,
        };
        self.position += (encoded.metadata_len + encoded.body_len) as u64;
        self.batches.push(snapshot);
        Ok(encoded)
    }
}
