//! Arrow IPC file writer driven by batch sealing.

use std::io::Write;
use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::ipc::convert::IpcSchemaEncoder;
use arrow::ipc::writer::{DictionaryTracker, IpcDataGenerator, IpcWriteOptions, write_message};
use arrow::ipc::{Block, Footer, FooterArgs, MetadataVersion};
use arrow::record_batch::RecordBatch;
use flatbuffers::FlatBufferBuilder;
use pgarrow_column::{ColumnDescriptor, ColumnStats};
use pgarrow_result::{Error, Result};
use pgarrow_table::{BatchBlock, BatchEncoder, EncodedBatch, TableBuffer};

use crate::array::column_array;
use crate::schema::{footer_schema, schema};

/// File magic, at the start and at the end of the file.
pub const ARROW_MAGIC: [u8; 6] = *b"ARROW1";

/// Continuation marker followed by a zero length.
const END_OF_STREAM: [u8; 8] = [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0];

/// Writes the Arrow IPC file format: magic, schema message, one record batch
/// message per sealed batch and, on [`ArrowFileWriter::finish`], the footer.
pub struct ArrowFileWriter<W: Write> {
    writer: W,
    columns: Vec<ColumnDescriptor>,
    schema: SchemaRef,
    position: u64,
    options: IpcWriteOptions,
    data_gen: IpcDataGenerator,
    dictionary_tracker: DictionaryTracker,
    blocks: Vec<Block>,
}

impl<W: Write> ArrowFileWriter<W> {
    /// Start a file for the given top-level columns and write its header.
    ///
    /// Only the descriptors' structure is kept; their buffers are not read.
    pub fn try_new(writer: W, columns: &[ColumnDescriptor]) -> Result<Self> {
        let mut columns = columns.to_vec();
        for column in columns.iter_mut() {
            column.clear();
        }
        let schema = Arc::new(schema(&columns));
        let mut this = Self {
            writer,
            columns,
            schema,
            position: 0,
            options: IpcWriteOptions::default(),
            data_gen: IpcDataGenerator::default(),
            dictionary_tracker: DictionaryTracker::new(false),
            blocks: Vec::new(),
        };
        this.write_header()?;
        Ok(this)
    }

    fn write_header(&mut self) -> Result<()> {
        self.writer.write_all(&ARROW_MAGIC)?;
        self.writer.write_all(&[0u8; 2])?;
        self.position += 8;

        let encoded = self.data_gen.schema_to_bytes_with_dictionary_tracker(
            &self.schema,
            &mut self.dictionary_tracker,
            &self.options,
        );
        let (meta, body) = write_message(&mut self.writer, encoded, &self.options)?;
        self.position += (meta + body) as u64;
        tracing::debug!(
            "[IPC] header and schema written, {} fields, {} bytes",
            self.schema.fields().len(),
            self.position
        );
        Ok(())
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Batches written so far.
    pub fn num_batches(&self) -> usize {
        self.blocks.len()
    }

    fn record_batch(&self, table: &TableBuffer) -> Result<RecordBatch> {
        if table.columns().len() != self.columns.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: table.columns().len(),
            });
        }
        let rows = table.nitems();
        let arrays = table
            .columns()
            .iter()
            .map(|column| column_array(column, rows))
            .collect::<Result<Vec<_>>>()?;
        Ok(RecordBatch::try_new(Arc::clone(&self.schema), arrays)?)
    }

    /// Write the end-of-stream marker and the footer, and hand back the
    /// underlying writer.
    ///
    /// `batches` are the blocks recorded by the table buffer that fed this
    /// writer; their statistics become the footer's min/max metadata.
    pub fn finish(mut self, batches: &[BatchBlock]) -> Result<W> {
        if batches.len() != self.blocks.len() {
            return Err(Error::Internal(format!(
                "{} batches written but {} block records given",
                self.blocks.len(),
                batches.len()
            )));
        }
        let batch_stats: Vec<Vec<ColumnStats>> =
            batches.iter().map(|block| block.stats.clone()).collect();
        self.writer.write_all(&END_OF_STREAM)?;

        let footer_schema: Schema = footer_schema(&self.columns, &self.schema, &batch_stats);
        let mut fbb = FlatBufferBuilder::new();
        let dictionaries = fbb.create_vector::<Block>(&[]);
        let record_batches = fbb.create_vector(&self.blocks);
        let schema = IpcSchemaEncoder::new().schema_to_fb_offset(&mut fbb, &footer_schema);
        let footer = Footer::create(
            &mut fbb,
            &FooterArgs {
                version: MetadataVersion::V5,
                schema: Some(schema),
                dictionaries: Some(dictionaries),
                recordBatches: Some(record_batches),
                custom_metadata: None,
            },
        );
        fbb.finish(footer, None);
        let footer_data = fbb.finished_data();
        let footer_len = i32::try_from(footer_data.len())
            .map_err(|_| Error::Internal("footer exceeds 2 GiB".into()))?;

        self.writer.write_all(footer_data)?;
        self.writer.write_all(&footer_len.to_le_bytes())?;
        self.writer.write_all(&ARROW_MAGIC)?;
        self.writer.flush()?;
        tracing::debug!(
            "[IPC] footer written: {} batches, {} footer bytes",
            self.blocks.len(),
            footer_len
        );
        Ok(self.writer)
    }
}

impl<W: Write> BatchEncoder for ArrowFileWriter<W> {
    fn position(&self) -> u64 {
        self.position
    }

    fn write_batch(&mut self, table: &TableBuffer) -> Result<EncodedBatch> {
        let batch = self.record_batch(table)?;
        let (_dictionaries, encoded) =
            self.data_gen
                .encoded_batch(&batch, &mut self.dictionary_tracker, &self.options)?;
        let (metadata_len, body_len) = write_message(&mut self.writer, encoded, &self.options)?;

        let offset = i64::try_from(self.position)
            .map_err(|_| Error::Internal("file offset overflow".into()))?;
        let meta = i32::try_from(metadata_len)
            .map_err(|_| Error::Internal("batch metadata exceeds 2 GiB".into()))?;
        self.blocks.push(Block::new(offset, meta, body_len as i64));
        self.position += (metadata_len + body_len) as u64;
        tracing::trace!(
            "[IPC] batch {} at {}: {} rows",
            self.blocks.len() - 1,
            offset,
            batch.num_rows()
        );
        Ok(EncodedBatch {
            metadata_len,
            body_len,
        })
    }
}
