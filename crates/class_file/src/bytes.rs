use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::{ClassFileError, Result};

/// Random access, big-endian view over class file bytes.
///
/// Offsets passed to the `read_*` methods are relative to the start of the view. A view
/// remembers where it starts in the container so errors report absolute offsets.
#[derive(Clone, Copy)]
pub struct ByteData<'a> {
    buf: &'a [u8],
    base: usize,
}
impl<'a> ByteData<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, base: 0 }
    }

    pub(crate) fn at(buf: &'a [u8], base: usize) -> Self {
        Self { buf, base }
    }

    /// Absolute offset of this view in the container.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the view starting `offset` bytes into this one.
    pub fn window(&self, offset: usize) -> Result<ByteData<'a>> {
        match self.buf.get(offset..) {
            Some(buf) => Ok(Self {
                buf,
                base: self.base + offset,
            }),
            None => Err(ClassFileError::Truncated {
                offset: self.base + self.buf.len(),
                needed: offset - self.buf.len(),
            }),
        }
    }

    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.buf.get(offset..end))
            .ok_or(ClassFileError::Truncated {
                offset: self.base + offset,
                needed: len,
            })
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        Ok(BigEndian::read_u16(self.bytes(offset, 2)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        Ok(BigEndian::read_u32(self.bytes(offset, 4)?))
    }

    pub fn read_i32(&self, offset: usize) -> Result<i32> {
        Ok(BigEndian::read_i32(self.bytes(offset, 4)?))
    }
}
impl fmt::Debug for ByteData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteData")
            .field("base", &self.base)
            .field("len", &self.buf.len())
            .finish()
    }
}
