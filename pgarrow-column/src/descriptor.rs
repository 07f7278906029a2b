//! Column descriptor tree.
//!
//! Each [`ColumnDescriptor`] owns its nested content outright: a composite
//! owns its fields in ordinal order and an array owns its single element
//! descriptor. There are no parent links; every traversal is top-down.

use pgarrow_result::Result;

use crate::binding;
use crate::buffer::ColumnBuffer;
use crate::types::{Alignment, ArrowTypeTag, Oid, TypeCategory, arrow_align};

/// Static catalog attributes of one column or nested field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnAttrs {
    pub name: String,
    pub type_id: Oid,
    pub type_mod: i32,
    /// `typlen`: positive for fixed-length types, `-1` for varlena, `-2` for
    /// C strings.
    pub type_len: i16,
    pub by_value: bool,
    pub alignment: Alignment,
    pub category: TypeCategory,
    pub namespace: String,
    pub type_name: String,
}

/// Nested content of a descriptor.
#[derive(Clone, Debug, Default)]
pub enum Nested {
    #[default]
    None,
    /// Composite fields, index `i` holds ordinal `i + 1`.
    Composite(Vec<ColumnDescriptor>),
    /// Array element type.
    Array(Box<ColumnDescriptor>),
}

#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_id: Oid,
    pub type_mod: i32,
    pub type_len: i16,
    pub by_value: bool,
    pub alignment: Alignment,
    pub category: TypeCategory,
    pub namespace: String,
    pub type_name: String,
    pub type_tag: ArrowTypeTag,
    pub nested: Nested,
    pub buffer: ColumnBuffer,
}

impl ColumnDescriptor {
    /// Build a descriptor over already-resolved nested content and bind its
    /// Arrow type. The buffer starts empty.
    pub fn new(attrs: ColumnAttrs, nested: Nested) -> Result<Self> {
        let type_tag = binding::resolve_type_tag(&attrs, &nested)?;
        let ColumnAttrs {
            name,
            type_id,
            type_mod,
            type_len,
            by_value,
            alignment,
            category,
            namespace,
            type_name,
        } = attrs;
        Ok(Self {
            name,
            type_id,
            type_mod,
            type_len,
            by_value,
            alignment,
            category,
            namespace,
            type_name,
            type_tag,
            nested,
            buffer: ColumnBuffer::new(),
        })
    }

    /// Composite fields, empty for non-composites.
    pub fn fields(&self) -> &[ColumnDescriptor] {
        match &self.nested {
            Nested::Composite(fields) => fields,
            _ => &[],
        }
    }

    pub fn element(&self) -> Option<&ColumnDescriptor> {
        match &self.nested {
            Nested::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Number of Arrow buffers this descriptor contributes on its own.
    pub fn buffer_count(&self) -> usize {
        self.type_tag.buffer_count()
    }

    /// Zero this column's buffer and every nested buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        match &mut self.nested {
            Nested::None => {}
            Nested::Composite(fields) => fields.iter_mut().for_each(ColumnDescriptor::clear),
            Nested::Array(element) => element.clear(),
        }
    }

    /// True when this buffer and every nested buffer are empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
            && match &self.nested {
                Nested::None => true,
                Nested::Composite(fields) => fields.iter().all(ColumnDescriptor::is_empty),
                Nested::Array(element) => element.is_empty(),
            }
    }

    /// Aligned bytes the batch body needs for this column and its children.
    /// The validity bitmap only counts once a null has been seen, since a
    /// null-free array is written without one.
    pub fn usage(&self) -> usize {
        let buf = &self.buffer;
        let mut usage = arrow_align(buf.values.len()) + arrow_align(buf.extra.len());
        if buf.null_count > 0 {
            usage += arrow_align(buf.nullmap.len());
        }
        usage
            + match &self.nested {
                Nested::None => 0,
                Nested::Composite(fields) => fields.iter().map(ColumnDescriptor::usage).sum(),
                Nested::Array(element) => element.usage(),
            }
    }

    /// Undo the null-count increments made while appending row `row`.
    ///
    /// The validity bit of `row` records whether the append saw a null, so
    /// no separate undo log is needed. Composite fields share the row index;
    /// array elements are found through the list offsets.
    pub fn undo_row_nulls(&mut self, row: usize) {
        if !self.buffer.nullmap.get_bit(row) {
            debug_assert!(self.buffer.null_count > 0, "null bit without null count");
            self.buffer.null_count = self.buffer.null_count.saturating_sub(1);
        }
        match &mut self.nested {
            Nested::None => {}
            Nested::Composite(fields) => {
                for field in fields.iter_mut() {
                    field.undo_row_nulls(row);
                }
            }
            Nested::Array(element) => {
                let start = self.buffer.values.i32_at(row);
                let end = self.buffer.values.i32_at(row + 1);
                if let (Some(start), Some(end)) = (start, end) {
                    for elem_row in start.max(0) as usize..end.max(0) as usize {
                        element.undo_row_nulls(elem_row);
                    }
                }
            }
        }
    }

    /// Number of Arrow field nodes in this subtree, including array elements.
    pub fn subtree_field_nodes(&self) -> usize {
        1 + match &self.nested {
            Nested::None => 0,
            Nested::Composite(fields) => fields
                .iter()
                .map(ColumnDescriptor::subtree_field_nodes)
                .sum(),
            Nested::Array(element) => element.subtree_field_nodes(),
        }
    }
}
