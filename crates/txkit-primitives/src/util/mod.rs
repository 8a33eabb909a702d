//! Utility types for binary serialization.
//!
//! Provides VarInt encoding/decoding, `ByteReader` and `ByteWriter` cursors
//! for reading/writing Bitcoin protocol binary data, varint-prefixed byte
//! strings, and `ByteSource`, the single conversion point that turns hex
//! strings or raw bytes supplied by callers into one canonical byte buffer.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// A Bitcoin protocol variable-length integer.
///
/// VarInt is used in transaction data to indicate the number of upcoming fields
/// or the length of an upcoming field. The encoding uses 1, 3, 5, or 9 bytes
/// depending on the magnitude of the value, all little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Decode a VarInt from the start of a byte slice.
    ///
    /// # Returns
    /// A tuple of `(VarInt, bytes_consumed)`, or an error if the slice ends
    /// before the encoding does.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), PrimitivesError> {
        let mut reader = ByteReader::new(data);
        let value = reader.read_varint()?;
        Ok((value, reader.position()))
    }

    /// Return the wire-format byte length of this VarInt.
    ///
    /// # Returns
    /// 1, 3, 5, or 9 depending on the value.
    pub fn length(&self) -> usize {
        if self.0 < 0xfd {
            1
        } else if self.0 < 0x10000 {
            3
        } else if self.0 < 0x1_0000_0000 {
            5
        } else {
            9
        }
    }

    /// Encode the VarInt into a new byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let v = self.0;
        let mut buf = Vec::with_capacity(self.length());
        if v < 0xfd {
            buf.push(v as u8);
        } else if v < 0x10000 {
            buf.push(0xfd);
            buf.extend_from_slice(&(v as u16).to_le_bytes());
        } else if v < 0x1_0000_0000 {
            buf.push(0xfe);
            buf.extend_from_slice(&(v as u32).to_le_bytes());
        } else {
            buf.push(0xff);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// Return the underlying u64 value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        VarInt(v)
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

// ---------------------------------------------------------------------------
// Offset-based helpers
// ---------------------------------------------------------------------------

/// Read a varint from `bytes` starting at `offset`.
///
/// # Returns
/// `(value, new_offset)` where `new_offset` points just past the varint.
pub fn read_varint(bytes: &[u8], offset: usize) -> Result<(u64, usize), PrimitivesError> {
    let mut reader = ByteReader::at(bytes, offset);
    let value = reader.read_varint()?;
    Ok((value.value(), reader.position()))
}

/// Encode `value` as a varint.
pub fn write_varint(value: u64) -> Vec<u8> {
    VarInt(value).to_bytes()
}

/// Read a varint-prefixed byte string from `bytes` starting at `offset`.
///
/// # Returns
/// `(data, new_offset)`, or an error if the string is truncated.
pub fn read_varstring(bytes: &[u8], offset: usize) -> Result<(Vec<u8>, usize), PrimitivesError> {
    let mut reader = ByteReader::at(bytes, offset);
    let data = reader.read_varstring()?.to_vec();
    Ok((data, reader.position()))
}

/// Encode `data` as a varint length followed by the bytes themselves.
pub fn write_varstring(data: &[u8]) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(data.len() + 9);
    writer.write_varstring(data);
    writer.into_bytes()
}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// A cursor-based reader for Bitcoin protocol binary data.
///
/// Wraps a byte slice and maintains a read position, providing methods
/// to read fixed-size integers and VarInt values in little-endian order.
/// Every read fails with `UnexpectedEof` instead of panicking when the
/// data is truncated mid-field.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Create a reader positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        ByteReader { data, pos: offset }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// # Returns
    /// A byte slice of length `n`, or an error if insufficient data remains.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(PrimitivesError::UnexpectedEof {
                offset: self.pos,
                wanted: n,
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read `N` bytes into a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte and advance the position.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u16 and advance the position by 2 bytes.
    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32 and advance the position by 4 bytes.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64 and advance the position by 8 bytes.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a VarInt and advance the position accordingly.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let first = self.read_u8()?;
        let value = match first {
            0xff => self.read_u64_le()?,
            0xfe => self.read_u32_le()? as u64,
            0xfd => self.read_u16_le()? as u64,
            b => b as u64,
        };
        Ok(VarInt(value))
    }

    /// Read a varint length followed by that many bytes.
    pub fn read_varstring(&mut self) -> Result<&'a [u8], PrimitivesError> {
        let len = self.read_varint()?.value();
        let len = usize::try_from(len).map_err(|_| PrimitivesError::UnexpectedEof {
            offset: self.pos,
            wanted: usize::MAX,
        })?;
        self.read_bytes(len)
    }

    /// Return the current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Return the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}

// ---------------------------------------------------------------------------
// ByteWriter
// ---------------------------------------------------------------------------

/// A buffer-based writer for Bitcoin protocol binary data.
///
/// Wraps a `Vec<u8>` and provides methods to append fixed-size integers
/// and VarInt values in little-endian order.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// Create a new writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes to the buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte to the buffer.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u32 (4 bytes) to the buffer.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64 (8 bytes) to the buffer.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a VarInt to the buffer.
    pub fn write_varint(&mut self, varint: VarInt) {
        self.buf.extend_from_slice(&varint.to_bytes());
    }

    /// Append a varint length prefix followed by `data`.
    pub fn write_varstring(&mut self, data: &[u8]) {
        self.write_varint(VarInt::from(data.len()));
        self.write_bytes(data);
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Return a reference to the current buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Return the current length of the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ByteSource
// ---------------------------------------------------------------------------

/// Caller-supplied bytes in either of the accepted representations.
///
/// Hashes, scripts, keys and raw transactions may be handed in as a hex
/// string or as raw bytes. Each public entry point converts its argument
/// with [`to_bytes`] once; nothing past that boundary sees a `ByteSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteSource<'a> {
    /// Hex text, upper or lower case, optionally surrounded by whitespace.
    Hex(&'a str),
    /// Raw bytes used as-is.
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for ByteSource<'a> {
    fn from(s: &'a str) -> Self {
        ByteSource::Hex(s)
    }
}

impl<'a> From<&'a String> for ByteSource<'a> {
    fn from(s: &'a String) -> Self {
        ByteSource::Hex(s.as_str())
    }
}

impl<'a> From<&'a [u8]> for ByteSource<'a> {
    fn from(b: &'a [u8]) -> Self {
        ByteSource::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for ByteSource<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        ByteSource::Bytes(b.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ByteSource<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        ByteSource::Bytes(b.as_slice())
    }
}

/// Normalize any accepted byte representation into an owned buffer.
///
/// # Returns
/// The decoded bytes, or `InvalidHex` if a hex string is malformed.
pub fn to_bytes<'a>(input: impl Into<ByteSource<'a>>) -> Result<Vec<u8>, PrimitivesError> {
    match input.into() {
        ByteSource::Hex(s) => Ok(hex::decode(s.trim())?),
        ByteSource::Bytes(b) => Ok(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encodings() {
        let cases: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (252, vec![0xfc]),
            (253, vec![0xfd, 0xfd, 0x00]),
            (65535, vec![0xfd, 0xff, 0xff]),
            (65536, vec![0xfe, 0x00, 0x00, 0x01, 0x00]),
            (4294967295, vec![0xfe, 0xff, 0xff, 0xff, 0xff]),
            (4294967296, vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]),
            (u64::MAX, vec![0xff; 9]),
        ];

        for (value, expected) in cases {
            assert_eq!(write_varint(value), expected, "encoding of {}", value);
            assert_eq!(VarInt(value).length(), expected.len(), "length of {}", value);
            let (decoded, consumed) = VarInt::from_bytes(&expected).unwrap();
            assert_eq!(decoded.value(), value);
            assert_eq!(consumed, expected.len());
        }
    }

    #[test]
    fn test_read_varint_with_offset() {
        let data = [0xaa, 0xbb, 0xfd, 0x00, 0x01, 0x07];
        let (value, next) = read_varint(&data, 2).unwrap();
        assert_eq!(value, 256);
        assert_eq!(next, 5);
        let (value, next) = read_varint(&data, next).unwrap();
        assert_eq!(value, 7);
        assert_eq!(next, 6);
    }

    #[test]
    fn test_read_varint_truncated() {
        assert!(read_varint(&[0xfd, 0x01], 0).is_err());
        assert!(read_varint(&[0xfe, 0x01, 0x02, 0x03], 0).is_err());
        assert!(read_varint(&[], 0).is_err());
        assert!(VarInt::from_bytes(&[0xff]).is_err());
    }

    #[test]
    fn test_varstring_roundtrip() {
        let encoded = write_varstring(b"hello");
        assert_eq!(encoded, b"\x05hello");
        let (data, next) = read_varstring(&encoded, 0).unwrap();
        assert_eq!(data, b"hello");
        assert_eq!(next, encoded.len());
    }

    #[test]
    fn test_varstring_truncated() {
        let err = read_varstring(&[0x05, b'h', b'e'], 0).unwrap_err();
        assert!(matches!(err, PrimitivesError::UnexpectedEof { offset: 1, wanted: 5 }));
    }

    #[test]
    fn test_reader_writer_roundtrip() {
        let mut writer = ByteWriter::new();
        writer.write_u8(0x42);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_u64_le(0x0102030405060708);
        writer.write_varint(VarInt(300));
        writer.write_varstring(b"abc");

        let data = writer.into_bytes();
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_varint().unwrap(), VarInt(300));
        assert_eq!(reader.read_varstring().unwrap(), b"abc");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_eof() {
        let mut reader = ByteReader::new(&[0x01]);
        assert!(reader.read_u8().is_ok());
        assert!(reader.read_u8().is_err());
        assert!(reader.read_bytes(usize::MAX).is_err());
    }

    #[test]
    fn test_to_bytes_accepts_every_representation() {
        let expected = vec![0x81, 0xb4, 0xc8, 0x32];
        assert_eq!(to_bytes("81b4c832").unwrap(), expected);
        assert_eq!(to_bytes("81B4C832").unwrap(), expected);
        assert_eq!(to_bytes(&"81b4c832".to_string()).unwrap(), expected);
        assert_eq!(to_bytes(expected.as_slice()).unwrap(), expected);
        assert_eq!(to_bytes(&expected).unwrap(), expected);
        assert_eq!(to_bytes(&[0x81u8, 0xb4, 0xc8, 0x32]).unwrap(), expected);
    }

    #[test]
    fn test_to_bytes_rejects_bad_hex() {
        assert!(to_bytes("xyz0").is_err());
        assert!(to_bytes("abc").is_err());
    }
}
