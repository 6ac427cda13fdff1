//! Offset-table binary encoding
//!
//! Buffers are built back to front: every string, vector and nested table
//! is written before the table that refers to it, and referenced by a
//! `uoffset` relative to the referring slot. The layout is flatbuffers
//! compatible:
//!
//! ```text
//! [root uoffset: u32]
//! ...
//! vtable:  [vtable size: u16][table size: u16][field offset: u16]...
//! table:   [soffset to vtable: i32][fields...]
//! string:  [len: u32][bytes][0]
//! vector:  [len: u32][uoffset]...
//! ```
//!
//! All integers are little-endian. Scalars equal to their default are not
//! written; the vtable entry for them is zero.

pub mod reader;
pub mod schema;

pub use reader::{Table, Vector};

const SIZE_U8: usize = 1;
const SIZE_U16: usize = 2;
const SIZE_U32: usize = 4;
const SIZE_I64: usize = 8;

/// Default initial capacity of a builder, in bytes
pub const DEFAULT_CAPACITY: usize = 1024;

/// Position of an already written object, counted from the end of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset(u32);

impl Offset {
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Back-to-front buffer builder
#[derive(Debug)]
pub struct Builder {
    buf: Vec<u8>,
    head: usize,
    min_align: usize,
    vtable: Vec<u32>,
    object_end: u32,
    nested: bool,
    finished: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            head: capacity,
            min_align: 1,
            vtable: Vec::new(),
            object_end: 0,
            nested: false,
            finished: false,
        }
    }

    /// Number of bytes written so far
    pub fn offset(&self) -> u32 {
        uoffset(self.buf.len() - self.head)
    }

    // =========================================================================
    // Raw placement
    // =========================================================================

    fn grow(&mut self) {
        let old_len = self.buf.len();
        let new_len = (old_len * 2).max(64);
        let mut grown = vec![0; new_len];
        grown[new_len - old_len..].copy_from_slice(&self.buf);
        self.buf = grown;
        self.head += new_len - old_len;
    }

    fn pad(&mut self, n: usize) {
        for _ in 0..n {
            self.head -= 1;
            self.buf[self.head] = 0;
        }
    }

    /// Align so that after writing `additional` bytes the next `size`-byte
    /// scalar lands on a multiple of `size`, growing the buffer as needed.
    fn prep(&mut self, size: usize, additional: usize) {
        if size > self.min_align {
            self.min_align = size;
        }
        let used = self.buf.len() - self.head;
        let align = (used + additional).wrapping_neg() & (size - 1);
        while self.head < align + size + additional {
            self.grow();
        }
        self.pad(align);
    }

    fn place(&mut self, bytes: &[u8]) {
        self.head -= bytes.len();
        self.buf[self.head..self.head + bytes.len()].copy_from_slice(bytes);
    }

    fn prepend_u8(&mut self, value: u8) {
        self.prep(SIZE_U8, 0);
        self.place(&[value]);
    }

    fn prepend_u16(&mut self, value: u16) {
        self.prep(SIZE_U16, 0);
        self.place(&value.to_le_bytes());
    }

    fn prepend_u32(&mut self, value: u32) {
        self.prep(SIZE_U32, 0);
        self.place(&value.to_le_bytes());
    }

    fn prepend_i32(&mut self, value: i32) {
        self.prep(SIZE_U32, 0);
        self.place(&value.to_le_bytes());
    }

    fn prepend_i64(&mut self, value: i64) {
        self.prep(SIZE_I64, 0);
        self.place(&value.to_le_bytes());
    }

    /// Write a uoffset pointing at `target`, relative to where it is stored
    fn prepend_offset(&mut self, target: Offset) {
        self.prep(SIZE_U32, 0);
        assert!(
            target.0 <= self.offset(),
            "offset {} refers to an object not yet written",
            target.0
        );
        let relative = self.offset() - target.0 + SIZE_U32 as u32;
        self.place(&relative.to_le_bytes());
    }

    fn assert_not_nested(&self) {
        assert!(
            !self.nested,
            "cannot start an object while a table or vector is open"
        );
    }

    fn assert_not_finished(&self) {
        assert!(!self.finished, "builder already finished");
    }

    // =========================================================================
    // Strings and vectors
    // =========================================================================

    pub fn create_string(&mut self, value: &str) -> Offset {
        self.create_bytes(value.as_bytes())
    }

    /// Length-prefixed, NUL-terminated byte string
    pub fn create_bytes(&mut self, value: &[u8]) -> Offset {
        self.assert_not_finished();
        self.assert_not_nested();
        self.prep(SIZE_U32, value.len() + 1);
        self.place(&[0]);
        self.place(value);
        self.place(&uoffset(value.len()).to_le_bytes());
        Offset(self.offset())
    }

    /// Vector of references to objects already written, in `items` order
    pub fn create_vector(&mut self, items: &[Offset]) -> Offset {
        let mut vector = VectorBuilder::start(self, items.len());
        for &item in items.iter().rev() {
            vector.push(item);
        }
        vector.seal()
    }

    /// Encode each string, then a vector referencing them in order
    pub fn create_string_vector<S: AsRef<str>>(&mut self, items: &[S]) -> Offset {
        let offsets: Vec<Offset> = items
            .iter()
            .map(|s| self.create_string(s.as_ref()))
            .collect();
        self.create_vector(&offsets)
    }

    // =========================================================================
    // Tables
    // =========================================================================

    pub fn start_table(&mut self, field_count: usize) {
        self.assert_not_finished();
        self.assert_not_nested();
        self.vtable.clear();
        self.vtable.resize(field_count, 0);
        self.object_end = self.offset();
        self.nested = true;
    }

    fn slot(&mut self, slot: usize) {
        assert!(self.nested, "field added outside of a table");
        self.vtable[slot] = self.offset();
    }

    pub fn add_u8(&mut self, slot: usize, value: u8, default: u8) {
        if value != default {
            self.prepend_u8(value);
            self.slot(slot);
        }
    }

    pub fn add_bool(&mut self, slot: usize, value: bool, default: bool) {
        self.add_u8(slot, value as u8, default as u8);
    }

    pub fn add_u32(&mut self, slot: usize, value: u32, default: u32) {
        if value != default {
            self.prepend_u32(value);
            self.slot(slot);
        }
    }

    pub fn add_i64(&mut self, slot: usize, value: i64, default: i64) {
        if value != default {
            self.prepend_i64(value);
            self.slot(slot);
        }
    }

    pub fn add_offset(&mut self, slot: usize, target: Offset) {
        self.prepend_offset(target);
        self.slot(slot);
    }

    pub fn end_table(&mut self) -> Offset {
        assert!(self.nested, "end_table without start_table");

        // Placeholder for the soffset to the vtable
        self.prepend_i32(0);
        let object_offset = self.offset();

        let vtable = std::mem::take(&mut self.vtable);
        let used = vtable
            .iter()
            .rposition(|&field| field != 0)
            .map_or(0, |i| i + 1);

        for &field in vtable[..used].iter().rev() {
            let relative = if field != 0 { object_offset - field } else { 0 };
            self.prepend_u16(relative as u16);
        }
        self.prepend_u16((object_offset - self.object_end) as u16);
        self.prepend_u16(((used + 2) * SIZE_U16) as u16);

        let vtable_offset = self.offset();
        let table_pos = self.buf.len() - object_offset as usize;
        let soffset = (vtable_offset - object_offset) as i32;
        self.buf[table_pos..table_pos + SIZE_U32].copy_from_slice(&soffset.to_le_bytes());

        self.vtable = vtable;
        self.vtable.clear();
        self.nested = false;
        Offset(object_offset)
    }

    // =========================================================================
    // Finishing
    // =========================================================================

    /// Record where the root table begins. No further writes are allowed.
    pub fn finish(&mut self, root: Offset) {
        self.assert_not_finished();
        self.assert_not_nested();
        let align = self.min_align;
        self.prep(align, SIZE_U32);
        self.prepend_offset(root);
        self.finished = true;
    }

    pub fn finished_data(&self) -> &[u8] {
        assert!(self.finished, "builder not finished");
        &self.buf[self.head..]
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        assert!(self.finished, "builder not finished");
        self.buf.drain(..self.head);
        self.buf
    }
}

/// Writes one vector of offsets: declare the length, push the elements
/// last-to-first, then seal. Sealing checks the declared length was met.
struct VectorBuilder<'b> {
    builder: &'b mut Builder,
    len: usize,
    pushed: usize,
}

impl<'b> VectorBuilder<'b> {
    fn start(builder: &'b mut Builder, len: usize) -> Self {
        builder.assert_not_finished();
        builder.assert_not_nested();
        builder.nested = true;
        builder.prep(SIZE_U32, SIZE_U32 * len);
        Self {
            builder,
            len,
            pushed: 0,
        }
    }

    fn push(&mut self, item: Offset) {
        assert!(self.pushed < self.len, "vector overflow");
        self.builder.prepend_offset(item);
        self.pushed += 1;
    }

    fn seal(self) -> Offset {
        assert_eq!(self.pushed, self.len, "vector sealed before all elements were written");
        self.builder.nested = false;
        self.builder.place(&uoffset(self.len).to_le_bytes());
        Offset(self.builder.offset())
    }
}

/// Sizes and offsets are stored as u32; anything larger cannot be encoded
fn uoffset(len: usize) -> u32 {
    assert!(len <= u32::MAX as usize, "buffer exceeds 4 GiB");
    len as u32
}
