//! Row ingestion and batch sealing.

use pgarrow_catalog::ResolvedSchema;
use pgarrow_column::{ColumnDescriptor, put_value, stat_update};
use pgarrow_result::{Error, Result};

use crate::config::TableBufferConfig;
use crate::encoder::{BatchBlock, BatchEncoder, EncodedBatch};
use crate::page::{RowPage, WireFormat};

/// Column buffers of the open batch plus the locations of sealed batches.
///
/// Rows are appended one at a time. When a row pushes the aligned buffer
/// usage past the segment size, the batch accumulated so far is sealed and
/// the row is appended again to the fresh buffers.
#[derive(Debug, Clone)]
pub struct TableBuffer {
    columns: Vec<ColumnDescriptor>,
    nitems: usize,
    segment_size: usize,
    num_field_nodes: usize,
    num_buffers: usize,
    blocks: Vec<BatchBlock>,
}

impl TableBuffer {
    pub fn new(schema: ResolvedSchema, config: TableBufferConfig) -> Self {
        Self {
            columns: schema.columns,
            nitems: 0,
            segment_size: config.segment_size,
            num_field_nodes: schema.totals.field_nodes,
            num_buffers: schema.totals.buffers,
            blocks: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Rows in the open batch.
    pub fn nitems(&self) -> usize {
        self.nitems
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn num_field_nodes(&self) -> usize {
        self.num_field_nodes
    }

    pub fn num_buffers(&self) -> usize {
        self.num_buffers
    }

    /// Sealed batches in write order.
    pub fn blocks(&self) -> &[BatchBlock] {
        &self.blocks
    }

    /// Total rows written out so far.
    pub fn rows_written(&self) -> usize {
        self.blocks.iter().map(|b| b.rows).sum()
    }

    fn check_page<P: RowPage + ?Sized>(&self, page: &P) -> Result<()> {
        if page.num_fields() != self.columns.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: page.num_fields(),
            });
        }
        for (field, column) in self.columns.iter().enumerate() {
            if page.field_format(field) != WireFormat::Binary {
                return Err(Error::NonBinaryFormat {
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Ingest every row of `page`, sealing batches through `encoder` as the
    /// segment size is reached. Returns the number of rows ingested.
    pub fn append_page<P, E>(&mut self, page: &P, encoder: &mut E) -> Result<usize>
    where
        P: RowPage + ?Sized,
        E: BatchEncoder + ?Sized,
    {
        self.check_page(page)?;
        for row in 0..page.num_rows() {
            self.append_row(page, row, encoder)?;
        }
        tracing::trace!(
            "[INGEST] page of {} rows, open batch holds {}",
            page.num_rows(),
            self.nitems
        );
        Ok(page.num_rows())
    }

    fn append_row<P, E>(&mut self, page: &P, row: usize, encoder: &mut E) -> Result<()>
    where
        P: RowPage + ?Sized,
        E: BatchEncoder + ?Sized,
    {
        loop {
            let mut usage = 0usize;
            for (field, column) in self.columns.iter_mut().enumerate() {
                usage += put_value(column, self.nitems, page.value(row, field))?;
            }
            if usage <= self.segment_size {
                break;
            }
            // After a seal the buffers are empty, so a second breach lands here.
            if self.nitems == 0 {
                return Err(Error::RowExceedsSegment {
                    usage,
                    segment_size: self.segment_size,
                });
            }
            tracing::debug!(
                "[INGEST] row {} needs {} bytes over segment size {}; sealing {} rows",
                row,
                usage,
                self.segment_size,
                self.nitems
            );
            // The row's bytes stay past `nitems` in the sealed buffers; only
            // its null counts would leak into the batch.
            for column in self.columns.iter_mut() {
                column.undo_row_nulls(self.nitems);
            }
            self.write_out(encoder)?;
        }

        for (field, column) in self.columns.iter_mut().enumerate() {
            stat_update(column, page.value(row, field))?;
        }
        self.nitems += 1;
        Ok(())
    }

    /// Seal the open batch: hand it to `encoder`, record its block and reset
    /// every column buffer.
    pub fn write_out<E: BatchEncoder + ?Sized>(&mut self, encoder: &mut E) -> Result<()> {
        if self.nitems == 0 {
            return Err(Error::Internal("no rows to write out".into()));
        }
        let offset = encoder.position();
        let EncodedBatch {
            metadata_len,
            body_len,
        } = encoder.write_batch(self)?;
        let block = BatchBlock {
            offset,
            metadata_len,
            body_len,
            rows: self.nitems,
            stats: self.columns.iter().map(|c| *c.buffer.stats()).collect(),
        };
        tracing::debug!(
            "[SEAL] batch {} at offset {}: {} rows, metadata {} bytes, body {} bytes",
            self.blocks.len(),
            block.offset,
            block.rows,
            block.metadata_len,
            block.body_len
        );
        self.blocks.push(block);
        for column in self.columns.iter_mut() {
            column.clear();
        }
        self.nitems = 0;
        Ok(())
    }

    /// Seal the trailing partial batch, if any.
    pub fn flush<E: BatchEncoder + ?Sized>(&mut self, encoder: &mut E) -> Result<()> {
        if self.nitems > 0 {
            self.write_out(encoder)?;
        }
        Ok(())
    }
}
