//! Pages of result rows handed to the ingestion engine.

use pgarrow_result::{Error, Result};

/// Wire format of one result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Text,
    Binary,
}

/// A page of query result rows.
///
/// Cells are the raw binary send payloads; `None` is SQL NULL.
pub trait RowPage {
    fn num_rows(&self) -> usize;

    fn num_fields(&self) -> usize;

    fn field_format(&self, field: usize) -> WireFormat;

    fn value(&self, row: usize, field: usize) -> Option<&[u8]>;
}

/// Row page that owns its cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedRowPage {
    formats: Vec<WireFormat>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl OwnedRowPage {
    /// An empty page of `num_fields` binary fields.
    pub fn new(num_fields: usize) -> Self {
        Self::with_formats(vec![WireFormat::Binary; num_fields])
    }

    pub fn with_formats(formats: Vec<WireFormat>) -> Self {
        Self {
            formats,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<Option<Vec<u8>>>) -> Result<()> {
        if cells.len() != self.formats.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.formats.len(),
                actual: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl RowPage for OwnedRowPage {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn num_fields(&self) -> usize {
        self.formats.len()
    }

    fn field_format(&self, field: usize) -> WireFormat {
        self.formats.get(field).copied().unwrap_or(WireFormat::Text)
    }

    fn value(&self, row: usize, field: usize) -> Option<&[u8]> {
        self.rows.get(row)?.get(field)?.as_deref()
    }
}
