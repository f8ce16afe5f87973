//! Gd3 metadata tag handling, at the opaque-blob level.
//!
//! The Gd3 chunk appended to a VGM file consists of a four-byte identifier
//! (`"Gd3 "`), a 32-bit little-endian BCD version field, a 32-bit
//! little-endian string-block length, and eleven UTF-16LE nul-terminated
//! strings. The editing engines never interpret the strings; they only
//! need to know how many bytes the tag occupies so they can carry it over
//! verbatim when a file is rewritten. Decoding the strings for display is
//! left to front ends.
use crate::binutil::{ParseError, read_slice, read_u32_le_at};

/// Gd3 chunk version this crate knows how to carry (1.00, stored as BCD).
pub const GD3_VERSION: u32 = 0x0000_0100;

/// Validate the Gd3 chunk starting at offset 0 of `bytes` and return its
/// total length in bytes, header included.
///
/// The chunk may be followed by further data; only `12 + string block`
/// bytes are inspected. Errors:
///
/// - `HeaderTooShort` when fewer than 12 bytes remain.
/// - `InvalidIdent` when the identifier is not `"Gd3 "`.
/// - `UnsupportedVersion` when the version word is not 1.00.
/// - `OffsetOutOfRange` when the declared string block runs past the
///   buffer.
pub fn gd3_total_length(bytes: &[u8]) -> Result<usize, ParseError> {
    if bytes.len() < 12 {
        return Err(ParseError::HeaderTooShort("Gd3 header".into()));
    }

    let ident = read_slice(bytes, 0, 4)?;
    if ident != b"Gd3 " {
        let mut id: [u8; 4] = [0; 4];
        id.copy_from_slice(ident);
        return Err(ParseError::InvalidIdent(id));
    }

    let version = read_u32_le_at(bytes, 4)?;
    if version != GD3_VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }

    let data_len = read_u32_le_at(bytes, 8)? as usize;
    if bytes.len() < 12 + data_len {
        return Err(ParseError::OffsetOutOfRange {
            offset: 12,
            needed: data_len,
            available: bytes.len().saturating_sub(12),
            context: Some("gd3_strings".into()),
        });
    }

    Ok(12 + data_len)
}

/// Return the validated Gd3 chunk at the start of `bytes` as a borrowed
/// slice, ready to be appended verbatim to a rewritten file.
pub fn gd3_raw(bytes: &[u8]) -> Result<&[u8], ParseError> {
    let len = gd3_total_length(bytes)?;
    Ok(&bytes[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(strings: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"Gd3 ");
        out.extend_from_slice(&GD3_VERSION.to_le_bytes());
        out.extend_from_slice(&((strings * 2) as u32).to_le_bytes());
        for _ in 0..strings {
            out.extend_from_slice(&0_u16.to_le_bytes());
        }
        out
    }

    #[test]
    fn length_includes_header() {
        let t = tag(11);
        assert_eq!(gd3_total_length(&t), Ok(12 + 22));
    }

    #[test]
    fn rejects_bad_ident() {
        let mut t = tag(11);
        t[3] = b'!';
        assert_eq!(
            gd3_total_length(&t),
            Err(ParseError::InvalidIdent(*b"Gd3!"))
        );
    }

    #[test]
    fn rejects_truncated_string_block() {
        let mut t = tag(11);
        t.truncate(t.len() - 4);
        assert!(matches!(
            gd3_total_length(&t),
            Err(ParseError::OffsetOutOfRange { .. })
        ));
    }
}
