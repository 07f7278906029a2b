//! Growable byte buffers backing a column's Arrow layout.
//!
//! A [`ColumnBuffer`] holds the three physical buffers an Arrow array may
//! need (validity bitmap, values/offsets, variable-length payload) for the
//! rows of the open batch only. Clearing keeps the allocations so the next
//! batch reuses them.

use crate::stats::ColumnStats;

/// Append-only byte buffer with bitmap helpers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    #[inline]
    pub fn append_zero(&mut self, len: usize) {
        self.data.resize(self.data.len() + len, 0);
    }

    /// Truncate to empty, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[inline]
    fn ensure_bit(&mut self, index: usize) {
        let required = index / 8 + 1;
        if self.data.len() < required {
            self.data.resize(required, 0);
        }
    }

    pub fn set_bit(&mut self, index: usize) {
        self.ensure_bit(index);
        self.data[index >> 3] |= 1 << (index & 7);
    }

    pub fn clear_bit(&mut self, index: usize) {
        self.ensure_bit(index);
        self.data[index >> 3] &= !(1 << (index & 7));
    }

    /// Bits past the end of the buffer read as unset.
    pub fn get_bit(&self, index: usize) -> bool {
        self.data
            .get(index >> 3)
            .is_some_and(|byte| byte & (1 << (index & 7)) != 0)
    }

    /// Read the little-endian `i32` at element position `index`.
    pub fn i32_at(&self, index: usize) -> Option<i32> {
        let start = index * 4;
        let bytes = self.data.get(start..start + 4)?;
        Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// The last little-endian `i32`, if the buffer holds at least one.
    pub fn last_i32(&self) -> Option<i32> {
        let count = self.data.len() / 4;
        count.checked_sub(1).and_then(|idx| self.i32_at(idx))
    }
}

/// Mutable per-batch state of one column or nested field.
#[derive(Clone, Debug, Default)]
pub struct ColumnBuffer {
    pub(crate) nullmap: ByteBuffer,
    pub(crate) values: ByteBuffer,
    pub(crate) extra: ByteBuffer,
    pub(crate) null_count: usize,
    pub(crate) stats: ColumnStats,
}

impl ColumnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validity bitmap, one bit per row; a set bit means non-null.
    pub fn nullmap(&self) -> &ByteBuffer {
        &self.nullmap
    }

    /// Fixed-width values, or `i32` offsets for variable-length and list types.
    pub fn values(&self) -> &ByteBuffer {
        &self.values
    }

    /// Variable-length payload.
    pub fn extra(&self) -> &ByteBuffer {
        &self.extra
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    pub fn stats(&self) -> &ColumnStats {
        &self.stats
    }

    /// True when nothing has been appended since the last clear.
    pub fn is_empty(&self) -> bool {
        self.nullmap.is_empty()
            && self.values.is_empty()
            && self.extra.is_empty()
            && self.null_count == 0
            && self.stats.is_empty()
    }

    /// Reset counters and statistics and truncate every buffer.
    pub fn clear(&mut self) {
        self.null_count = 0;
        self.nullmap.clear();
        self.values.clear();
        self.extra.clear();
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_extend_the_buffer_with_zeroes() {
        let mut buf = ByteBuffer::new();
        buf.set_bit(9);
        assert_eq!(buf.as_slice(), &[0x00, 0x02]);
        assert!(buf.get_bit(9));
        assert!(!buf.get_bit(8));
        assert!(!buf.get_bit(100));

        buf.clear_bit(9);
        assert!(!buf.get_bit(9));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn cleared_bitmap_is_zero_filled_on_reuse() {
        let mut buf = ByteBuffer::new();
        for i in 0..16 {
            buf.set_bit(i);
        }
        buf.clear();
        buf.set_bit(3);
        assert_eq!(buf.as_slice(), &[0x08]);
    }

    #[test]
    fn offsets_are_read_back_little_endian() {
        let mut buf = ByteBuffer::new();
        assert_eq!(buf.last_i32(), None);
        buf.append(&0i32.to_le_bytes());
        buf.append(&7i32.to_le_bytes());
        assert_eq!(buf.i32_at(1), Some(7));
        assert_eq!(buf.last_i32(), Some(7));
        assert_eq!(buf.i32_at(2), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut col = ColumnBuffer::new();
        col.clear();
        assert!(col.is_empty());
        col.values.append(&[1, 2, 3]);
        col.null_count = 2;
        col.clear();
        col.clear();
        assert!(col.is_empty());
    }
}
