use bytemuck::Pod;

use crate::errors::{KeelError, Result};

/// Cursor over a little-endian binary asset.
///
/// Every read is bounds-checked; running off the end reports a truncated
/// file against the asset path, which is the parse-failure contract the
/// managers rely on.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    offset: usize,
    path: &'a str,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader over a file's bytes.
    #[must_use]
    pub fn new(data: &'a [u8], path: &'a str) -> Self {
        Self {
            data,
            offset: 0,
            path,
        }
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Takes `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(KeelError::asset(
                self.path,
                format!(
                    "truncated file: wanted {count} bytes at offset {}, {} remaining",
                    self.offset,
                    self.remaining()
                ),
            ));
        }
        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    /// Reads one POD value.
    pub fn read_pod<T: Pod>(&mut self) -> Result<T> {
        let bytes = self.read_bytes(size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Reads `count` POD values into an owned vector (copies, so the source
    /// alignment does not matter).
    pub fn read_pod_vec<T: Pod>(&mut self, count: usize) -> Result<Vec<T>> {
        let bytes = self.read_bytes(size_of::<T>() * count)?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }

    /// Reads a `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_pod()
    }

    /// Reads an `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_pod()
    }

    /// Reads a `u32` length prefix followed by that many UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_u32()? as usize;
        let bytes = self.read_bytes(length)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| KeelError::asset(self.path, "invalid UTF-8 in string"))
    }

    /// Checks a 4-byte magic signature.
    pub fn expect_magic(&mut self, magic: [u8; 4]) -> Result<()> {
        let bytes = self.read_bytes(4)?;
        if bytes != magic {
            return Err(KeelError::asset(
                self.path,
                format!("invalid signature {bytes:?}, expected {magic:?}"),
            ));
        }
        Ok(())
    }

    /// Asset path for error reporting.
    #[must_use]
    pub fn path(&self) -> &'a str {
        self.path
    }
}
