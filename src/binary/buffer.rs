//! Growable little-endian byte writer and the matching cursor reader

use crate::error::{Error, Result};

use super::encoding::{deinterleave, interleave};

/// Scratch buffer owned by a single export
///
/// Capacity doubles whenever a write would overflow it.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a writer with `capacity` bytes preallocated
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn ensure_capacity(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        if needed > self.buf.capacity() {
            let target = (self.buf.capacity() * 2).max(needed);
            self.buf.reserve_exact(target - self.buf.len());
        }
    }

    /// Append raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.ensure_capacity(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Append one byte
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    /// Append a little-endian u16
    pub fn write_u16_le(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a little-endian u32
    pub fn write_u32_le(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a little-endian f32
    pub fn write_f32_le(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a u32 byte length followed by the UTF-8 bytes of `s`
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let len = u32::try_from(s.len())
            .map_err(|_| Error::InvalidBinary(format!("string of {} bytes is too long", s.len())))?;
        self.write_u32_le(len);
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    /// Append `values` byte-plane interleaved
    pub fn write_interleaved(&mut self, values: &[u32]) {
        if values.is_empty() {
            return;
        }
        self.write_bytes(&interleave(values));
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current capacity
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Finish writing and take the bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a byte slice, failing cleanly on truncated input
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Take the next `len` bytes
    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::truncated(what))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, what)?);
        Ok(out)
    }

    /// Read one byte
    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.read_array::<1>(what)?[0])
    }

    /// Read a little-endian u16
    pub fn read_u16_le(&mut self, what: &str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(what)?))
    }

    /// Read a little-endian u32
    pub fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(what)?))
    }

    /// Read a little-endian f32
    pub fn read_f32_le(&mut self, what: &str) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array(what)?))
    }

    /// Read a u32-length-prefixed UTF-8 string
    pub fn read_string(&mut self, what: &str) -> Result<String> {
        let len = self.read_u32_le(what)? as usize;
        let bytes = self.read_bytes(len, what)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::InvalidBinary(format!("{} is not valid UTF-8: {}", what, e)))
    }

    /// Read `count` interleaved words
    pub fn read_interleaved(&mut self, count: usize, what: &str) -> Result<Vec<u32>> {
        let len = count
            .checked_mul(4)
            .ok_or_else(|| Error::truncated(what))?;
        let bytes = self.read_bytes(len, what)?;
        deinterleave(bytes, count)
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}
