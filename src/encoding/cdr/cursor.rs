// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR cursor for reading CDR-encoded data with proper alignment.
//!
//! Alignment is computed relative to the end of the 4-byte encapsulation
//! header, so `align(8)` at payload offset 4 skips four padding bytes no
//! matter where the payload sits in the buffer.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::core::{BagError, Result};

/// Size of the CDR encapsulation header (4 bytes).
pub const CDR_HEADER_SIZE: usize = 4;

/// Encapsulation kinds understood by the cursor (byte 1 of the header).
const CDR_BE: u8 = 0x00;
const CDR_LE: u8 = 0x01;
const CDR2_BE: u8 = 0x06;
const CDR2_LE: u8 = 0x07;

/// Cursor over one CDR payload.
///
/// ```
/// # fn main() -> robobag::Result<()> {
/// use robobag::encoding::cdr::CdrCursor;
///
/// let data = [0x00, 0x01, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00];
/// let mut cursor = CdrCursor::new(&data, "std_msgs/msg/UInt32")?;
/// assert_eq!(cursor.read_u32()?, 42);
/// # Ok(())
/// # }
/// ```
pub struct CdrCursor<'a> {
    data: &'a [u8],
    offset: usize,
    /// Alignment reference point (end of the encapsulation header)
    origin: usize,
    little_endian: bool,
    /// Largest alignment applied; XCDR2 caps 8-byte primitives at 4
    max_align: usize,
    /// Type name reported in decode errors
    type_name: &'a str,
}

impl<'a> CdrCursor<'a> {
    /// Create a cursor positioned after the encapsulation header.
    ///
    /// Header layout: byte 0 unused, byte 1 encapsulation kind, bytes 2-3
    /// options. Parameter-list and delimited encodings are rejected.
    pub fn new(data: &'a [u8], type_name: &'a str) -> Result<Self> {
        if data.len() < CDR_HEADER_SIZE {
            return Err(BagError::decode(
                type_name,
                0,
                format!(
                    "payload of {} bytes is shorter than the CDR header",
                    data.len()
                ),
            ));
        }

        let (little_endian, max_align) = match data[1] {
            CDR_BE => (false, 8),
            CDR_LE => (true, 8),
            CDR2_BE => (false, 4),
            CDR2_LE => (true, 4),
            kind => {
                return Err(BagError::decode(
                    type_name,
                    1,
                    format!("unsupported CDR encapsulation kind 0x{kind:02x}"),
                ))
            }
        };

        Ok(Self {
            data,
            offset: CDR_HEADER_SIZE,
            origin: CDR_HEADER_SIZE,
            little_endian,
            max_align,
            type_name,
        })
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    #[inline]
    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    /// Build a decode error at the current position.
    pub fn error(&self, message: impl Into<String>) -> BagError {
        BagError::decode(self.type_name, self.offset, message)
    }

    /// Skip padding so the next read is aligned to `size` bytes.
    pub fn align(&mut self, size: usize) -> Result<()> {
        let size = size.min(self.max_align);
        if size <= 1 {
            return Ok(());
        }
        let misalignment = (self.offset - self.origin) % size;
        if misalignment > 0 {
            self.skip(size - misalignment)?;
        }
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Borrow the next `count` bytes, unaligned.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.error(format!(
                "buffer too short: need {count} bytes, {} remaining",
                self.remaining()
            )));
        }
        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a sequence or string length prefix.
    ///
    /// A length that cannot fit in the rest of the buffer, assuming at least
    /// `min_element_size` bytes per element, is reported as corrupt.
    pub fn read_length(&mut self, min_element_size: usize) -> Result<usize> {
        let start = self.offset;
        let len = self.read_u32()? as usize;
        if len.saturating_mul(min_element_size) > self.remaining() {
            return Err(BagError::decode(
                self.type_name,
                start,
                format!(
                    "length {len} exceeds the {} bytes remaining",
                    self.remaining()
                ),
            ));
        }
        Ok(len)
    }

    /// Read a CDR string: u32 length including the terminating NUL.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_length(1)?;
        let bytes = self.take(len)?;
        let text = match bytes.split_last() {
            Some((0, rest)) => rest,
            _ => bytes,
        };
        Ok(String::from_utf8_lossy(text).into_owned())
    }
}

macro_rules! read_aligned {
    ($($name:ident => $ty:ty, $size:expr, $read:ident);* $(;)?) => {
        impl<'a> CdrCursor<'a> {
            $(
                pub fn $name(&mut self) -> Result<$ty> {
                    self.align($size)?;
                    let bytes = self.take($size)?;
                    Ok(if self.little_endian {
                        LittleEndian::$read(bytes)
                    } else {
                        BigEndian::$read(bytes)
                    })
                }
            )*
        }
    };
}

read_aligned! {
    read_u16 => u16, 2, read_u16;
    read_i16 => i16, 2, read_i16;
    read_u32 => u32, 4, read_u32;
    read_i32 => i32, 4, read_i32;
    read_u64 => u64, 8, read_u64;
    read_i64 => i64, 8, read_i64;
    read_f32 => f32, 4, read_f32;
    read_f64 => f64, 8, read_f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    const LE: [u8; 4] = [0x00, 0x01, 0x00, 0x00];

    fn payload(body: &[u8]) -> Vec<u8> {
        let mut data = LE.to_vec();
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_header_too_short() {
        let err = CdrCursor::new(&[0x00, 0x01], "t").err().unwrap();
        assert!(matches!(err, BagError::Decode { offset: 0, .. }));
    }

    #[test]
    fn test_rejects_parameter_list_encoding() {
        assert!(CdrCursor::new(&[0x00, 0x03, 0x00, 0x00], "t").is_err());
    }

    #[test]
    fn test_alignment_relative_to_payload() {
        // u8 then padding to 8, then f64 1.0
        let mut body = vec![7u8, 0, 0, 0, 0, 0, 0, 0];
        body.extend_from_slice(&1.0f64.to_le_bytes());
        let data = payload(&body);
        let mut cursor = CdrCursor::new(&data, "t").unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 7);
        assert_eq!(cursor.read_f64().unwrap(), 1.0);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_cdr2_caps_alignment_at_four() {
        let mut data = vec![0x00, 0x07, 0x00, 0x00];
        data.extend_from_slice(&[1, 0, 0, 0]);
        data.extend_from_slice(&5u64.to_le_bytes());
        let mut cursor = CdrCursor::new(&data, "t").unwrap();
        cursor.read_u8().unwrap();
        assert_eq!(cursor.read_u64().unwrap(), 5);
    }

    #[test]
    fn test_big_endian() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02];
        let mut cursor = CdrCursor::new(&data, "t").unwrap();
        assert!(!cursor.is_little_endian());
        assert_eq!(cursor.read_u32().unwrap(), 0x0102);
    }

    #[test]
    fn test_read_string_strips_nul() {
        let data = payload(&[3, 0, 0, 0, b'h', b'i', 0]);
        let mut cursor = CdrCursor::new(&data, "t").unwrap();
        assert_eq!(cursor.read_string().unwrap(), "hi");

        let data = payload(&[0, 0, 0, 0]);
        let mut cursor = CdrCursor::new(&data, "t").unwrap();
        assert_eq!(cursor.read_string().unwrap(), "");
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let data = payload(&[1, 0]);
        let mut cursor = CdrCursor::new(&data, "pkg/msg/T").unwrap();
        match cursor.read_u32().unwrap_err() {
            BagError::Decode {
                type_name, offset, ..
            } => {
                assert_eq!(type_name, "pkg/msg/T");
                assert_eq!(offset, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_length_prefix() {
        let data = payload(&[0xff, 0xff, 0xff, 0x00]);
        let mut cursor = CdrCursor::new(&data, "t").unwrap();
        assert!(cursor.read_length(1).is_err());
    }
}
