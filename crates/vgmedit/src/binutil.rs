//! Utilities used by parsers: parse error type and byte readers/writers.
use std::fmt;

/// Error type covering every way a VGM, GYM, SSL or CYM byte image can be
/// malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An attempted read was outside the available buffer range.
    ///
    /// - `offset` is the index that was attempted to be accessed.
    /// - `needed` is the number of bytes required for the operation.
    /// - `available` is the current buffer length.
    /// - `context` is an optional string describing the logical location
    ///   (for example `"gd3_offset"` or `"data_block"`) where the access
    ///   was attempted.
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<String>,
    },

    /// A four-byte identifier (typically ASCII) did not match an expected value.
    ///
    /// The contained array is the raw 4 bytes that were read.
    InvalidIdent([u8; 4]),

    /// The data uses a version the parser does not support.
    ///
    /// The contained `u32` is the raw version word.
    UnsupportedVersion(u32),

    /// The version word is not valid binary-coded decimal.
    ///
    /// Every nibble of the stored version must be 0 through 9; the contained
    /// `u32` is the offending raw word.
    InvalidBcd(u32),

    /// A reserved header byte between the last version-gated field and the
    /// start of command data was not zero.
    ///
    /// `offset` is the file position of the first non-zero byte.
    InvalidHeaderPadding { offset: usize },

    /// The declared data offset points inside the header's own field region.
    InvalidDataOffset { declared: usize, minimum: usize },

    /// The end-of-file offset stored in the header does not match the actual
    /// buffer length.
    EofMismatch { header: usize, actual: usize },

    /// A header was shorter than the minimum required length.
    ///
    /// The contained `String` identifies which header was too short
    /// (for example: "VGM header" or "Gd3 header").
    HeaderTooShort(String),

    /// An opcode byte was not recognized by the parser.
    ///
    /// - `opcode` is the raw opcode byte that was invalid.
    /// - `offset` is the position in the input where the opcode was found.
    UnknownOpcode { opcode: u8, offset: usize },

    /// The end-of-data marker arrived before the offset the header promised.
    ///
    /// `offset` is the position just past the marker, `expected` is where the
    /// command stream was supposed to end (GD3 start, or end of file).
    TrailingBytes { offset: usize, expected: usize },

    /// The command stream ran out before an end-of-data marker was found.
    PrematureEnd { offset: usize, expected: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(
                        f,
                        "offset out of range at {}: 0x{:X} (needed {} bytes, available {})",
                        ctx, offset, needed, available
                    )
                } else {
                    write!(
                        f,
                        "offset out of range: 0x{:X} (needed {} bytes, available {})",
                        offset, needed, available
                    )
                }
            }
            ParseError::InvalidIdent(id) => write!(f, "invalid ident: {:?}", id),
            ParseError::UnsupportedVersion(v) => {
                write!(f, "unsupported version: 0x{:08X}", v)
            }
            ParseError::InvalidBcd(v) => {
                write!(f, "version word is not valid BCD: 0x{:08X}", v)
            }
            ParseError::InvalidHeaderPadding { offset } => {
                write!(f, "non-zero reserved header byte at offset 0x{:X}", offset)
            }
            ParseError::InvalidDataOffset { declared, minimum } => {
                write!(
                    f,
                    "data offset 0x{:X} overlaps header fields (minimum 0x{:X})",
                    declared, minimum
                )
            }
            ParseError::EofMismatch { header, actual } => {
                write!(
                    f,
                    "header eof offset says {} bytes but file has {}",
                    header, actual
                )
            }
            ParseError::HeaderTooShort(name) => write!(f, "header too short: {}", name),
            ParseError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode 0x{:02X} at offset 0x{:X}", opcode, offset)
            }
            ParseError::TrailingBytes { offset, expected } => {
                write!(
                    f,
                    "end of data at offset 0x{:X} leaves trailing bytes before 0x{:X}",
                    offset, expected
                )
            }
            ParseError::PrematureEnd { offset, expected } => {
                write!(
                    f,
                    "command stream ended at offset 0x{:X} without an end marker (expected 0x{:X})",
                    offset, expected
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
///
/// Returns `Ok(u32)` when the four bytes starting at `off` are available.
/// Returns `Err(ParseError::OffsetOutOfRange)` when the buffer is too short.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    if bytes.len() < off + 4 {
        return Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: 4,
            available: bytes.len(),
            context: None,
        });
    }
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(&bytes[off..off + 4]);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
///
/// Returns `Ok(u16)` when the two bytes starting at `off` are available.
/// Returns `Err(ParseError::OffsetOutOfRange)` when the buffer is too short.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16, ParseError> {
    if bytes.len() < off + 2 {
        return Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: 2,
            available: bytes.len(),
            context: None,
        });
    }
    let mut tmp: [u8; 2] = [0; 2];
    tmp.copy_from_slice(&bytes[off..off + 2]);
    Ok(u16::from_le_bytes(tmp))
}

/// Read a 24-bit little-endian unsigned integer from `bytes` at `off`.
///
/// The value is widened into the low 24 bits of a `u32`. Returns
/// `Err(ParseError::OffsetOutOfRange)` when fewer than three bytes remain.
pub fn read_u24_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    if bytes.len() < off + 3 {
        return Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: 3,
            available: bytes.len(),
            context: None,
        });
    }
    let b0 = bytes[off] as u32;
    let b1 = bytes[off + 1] as u32;
    let b2 = bytes[off + 2] as u32;
    Ok(b0 | (b1 << 8) | (b2 << 16))
}

/// Read a single byte from `bytes` at `off`.
///
/// Returns `Ok(u8)` when `off` is a valid index into `bytes`. Returns
/// `Err(ParseError::OffsetOutOfRange)` when `off` is out of bounds.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, ParseError> {
    if bytes.len() <= off {
        return Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: 1,
            available: bytes.len(),
            context: None,
        });
    }
    Ok(bytes[off])
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
///
/// Returns `Ok(&[u8])` that borrows from the input slice when the requested
/// range is within bounds. Returns `Err(ParseError::OffsetOutOfRange)` when
/// the requested range exceeds the available buffer.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], ParseError> {
    if bytes.len() < off + len {
        return Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: len,
            // Report the remaining number of bytes from `off` to the end of the buffer.
            available: bytes.len().saturating_sub(off),
            context: Some("read_slice".into()),
        });
    }
    Ok(&bytes[off..off + len])
}

/// Write a 32-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// This function copies four bytes into `buf[off..off+4]`. It does not
/// perform bounds checking; callers must ensure the destination range is valid.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    let bytes = v.to_le_bytes();
    buf[off..off + 4].copy_from_slice(&bytes);
}

/// Write a 16-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// This function copies two bytes into `buf[off..off+2]`. It does not perform
/// bounds checking; callers must ensure the destination range is valid.
pub fn write_u16(buf: &mut [u8], off: usize, v: u16) {
    let bytes = v.to_le_bytes();
    buf[off..off + 2].copy_from_slice(&bytes);
}

/// Write a single byte `v` into `buf` at `off`.
///
/// This function writes `v` to `buf[off]`. It does not perform bounds
/// checking; callers must ensure `off` is a valid index.
pub fn write_u8(buf: &mut [u8], off: usize, v: u8) {
    buf[off] = v;
}
