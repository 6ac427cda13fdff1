//! Zero-copy access to encoded buffers
//!
//! Nothing is decoded up front. A `Table` only validates its own vtable
//! when opened; every field read is bounds-checked against the buffer and
//! follows at most one stored offset.

use crate::error::{DecodeError, Result};

fn read_array<const N: usize>(buf: &[u8], pos: usize) -> Result<[u8; N]> {
    let end = pos
        .checked_add(N)
        .ok_or_else(|| DecodeError::out_of_bounds(pos, buf.len()))?;
    let bytes = buf
        .get(pos..end)
        .ok_or_else(|| DecodeError::out_of_bounds(pos, buf.len()))?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

fn read_u8(buf: &[u8], pos: usize) -> Result<u8> {
    Ok(read_array::<1>(buf, pos)?[0])
}

fn read_u16(buf: &[u8], pos: usize) -> Result<u16> {
    read_array(buf, pos).map(u16::from_le_bytes)
}

fn read_u32(buf: &[u8], pos: usize) -> Result<u32> {
    read_array(buf, pos).map(u32::from_le_bytes)
}

fn read_i32(buf: &[u8], pos: usize) -> Result<i32> {
    read_array(buf, pos).map(i32::from_le_bytes)
}

fn read_i64(buf: &[u8], pos: usize) -> Result<i64> {
    read_array(buf, pos).map(i64::from_le_bytes)
}

/// Follow the uoffset stored at `pos`
fn indirect(buf: &[u8], pos: usize) -> Result<usize> {
    let relative = read_u32(buf, pos)? as usize;
    let target = pos
        .checked_add(relative)
        .ok_or_else(|| DecodeError::out_of_bounds(pos, buf.len()))?;
    if target >= buf.len() {
        return Err(DecodeError::out_of_bounds(target, buf.len()));
    }
    Ok(target)
}

/// Length-prefixed byte run starting at `pos`
fn byte_run(buf: &[u8], pos: usize) -> Result<&[u8]> {
    let len = read_u32(buf, pos)? as usize;
    let start = pos + 4;
    let end = start
        .checked_add(len)
        .ok_or_else(|| DecodeError::out_of_bounds(start, buf.len()))?;
    buf.get(start..end)
        .ok_or_else(|| DecodeError::out_of_bounds(end, buf.len()))
}

fn utf8<'a>(bytes: &'a [u8], field: &'static str) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { field })
}

/// A table inside an encoded buffer
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    buf: &'a [u8],
    pos: usize,
    vtable: usize,
    vtable_len: usize,
    name: &'static str,
}

impl<'a> Table<'a> {
    /// Open the root table whose uoffset is stored at `offset`
    pub fn root(buf: &'a [u8], offset: usize, name: &'static str) -> Result<Self> {
        let pos = indirect(buf, offset)?;
        Self::at(buf, pos, name)
    }

    pub(crate) fn at(buf: &'a [u8], pos: usize, name: &'static str) -> Result<Self> {
        let soffset = read_i32(buf, pos)? as i64;
        let vtable = pos as i64 - soffset;
        if vtable < 0 {
            return Err(DecodeError::InvalidVTable { position: pos });
        }
        let vtable = vtable as usize;
        let vtable_len = read_u16(buf, vtable)? as usize;
        let table_len = read_u16(buf, vtable + 2)? as usize;
        if vtable_len < 4 || vtable_len % 2 != 0 || vtable + vtable_len > buf.len() {
            return Err(DecodeError::InvalidVTable { position: pos });
        }
        if pos + table_len > buf.len() {
            return Err(DecodeError::out_of_bounds(pos + table_len, buf.len()));
        }
        Ok(Self {
            buf,
            pos,
            vtable,
            vtable_len,
            name,
        })
    }

    /// Absolute position of a field, if present
    fn field(&self, slot: usize) -> Result<Option<usize>> {
        let entry = 4 + slot * 2;
        if entry + 2 > self.vtable_len {
            return Ok(None);
        }
        match read_u16(self.buf, self.vtable + entry)? {
            0 => Ok(None),
            relative => Ok(Some(self.pos + relative as usize)),
        }
    }

    pub fn has_field(&self, slot: usize) -> Result<bool> {
        Ok(self.field(slot)?.is_some())
    }

    pub fn get_u8(&self, slot: usize, default: u8) -> Result<u8> {
        match self.field(slot)? {
            Some(pos) => read_u8(self.buf, pos),
            None => Ok(default),
        }
    }

    pub fn get_bool(&self, slot: usize, default: bool) -> Result<bool> {
        Ok(self.get_u8(slot, default as u8)? != 0)
    }

    pub fn get_u32(&self, slot: usize, default: u32) -> Result<u32> {
        match self.field(slot)? {
            Some(pos) => read_u32(self.buf, pos),
            None => Ok(default),
        }
    }

    pub fn get_i64(&self, slot: usize, default: i64) -> Result<i64> {
        match self.field(slot)? {
            Some(pos) => read_i64(self.buf, pos),
            None => Ok(default),
        }
    }

    pub fn get_bytes(&self, slot: usize) -> Result<Option<&'a [u8]>> {
        match self.field(slot)? {
            Some(pos) => byte_run(self.buf, indirect(self.buf, pos)?).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_str(&self, slot: usize, field: &'static str) -> Result<Option<&'a str>> {
        match self.get_bytes(slot)? {
            Some(bytes) => utf8(bytes, field).map(Some),
            None => Ok(None),
        }
    }

    pub fn required_str(&self, slot: usize, field: &'static str) -> Result<&'a str> {
        self.get_str(slot, field)?
            .ok_or(DecodeError::MissingField {
                table: self.name,
                field,
            })
    }

    pub fn get_table(&self, slot: usize, name: &'static str) -> Result<Option<Table<'a>>> {
        match self.field(slot)? {
            Some(pos) => Table::at(self.buf, indirect(self.buf, pos)?, name).map(Some),
            None => Ok(None),
        }
    }

    pub fn required_table(
        &self,
        slot: usize,
        field: &'static str,
        name: &'static str,
    ) -> Result<Table<'a>> {
        self.get_table(slot, name)?.ok_or(DecodeError::MissingField {
            table: self.name,
            field,
        })
    }

    pub fn get_vector(&self, slot: usize) -> Result<Option<Vector<'a>>> {
        match self.field(slot)? {
            Some(pos) => Vector::at(self.buf, indirect(self.buf, pos)?).map(Some),
            None => Ok(None),
        }
    }
}

/// A vector of offsets to strings or tables
#[derive(Debug, Clone, Copy)]
pub struct Vector<'a> {
    buf: &'a [u8],
    start: usize,
    len: usize,
}

impl<'a> Vector<'a> {
    fn at(buf: &'a [u8], pos: usize) -> Result<Self> {
        let len = read_u32(buf, pos)? as usize;
        let start = pos + 4;
        let end = len
            .checked_mul(4)
            .and_then(|bytes| start.checked_add(bytes))
            .ok_or_else(|| DecodeError::out_of_bounds(start, buf.len()))?;
        if end > buf.len() {
            return Err(DecodeError::out_of_bounds(end, buf.len()));
        }
        Ok(Self { buf, start, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn element(&self, index: usize) -> Result<usize> {
        if index >= self.len {
            return Err(DecodeError::out_of_bounds(
                self.start + index * 4,
                self.buf.len(),
            ));
        }
        indirect(self.buf, self.start + index * 4)
    }

    pub fn table_at(&self, index: usize, name: &'static str) -> Result<Table<'a>> {
        Table::at(self.buf, self.element(index)?, name)
    }

    pub fn str_at(&self, index: usize, field: &'static str) -> Result<&'a str> {
        utf8(byte_run(self.buf, self.element(index)?)?, field)
    }

    pub fn tables(&self, name: &'static str) -> Result<Vec<Table<'a>>> {
        (0..self.len).map(|i| self.table_at(i, name)).collect()
    }

    pub fn strs(&self, field: &'static str) -> Result<Vec<&'a str>> {
        (0..self.len).map(|i| self.str_at(i, field)).collect()
    }
}
