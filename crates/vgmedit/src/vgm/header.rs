//! VGM header model.
//!
//! Contents
//!
//! - [`VgmHeader`]: every field of the version 1.00 through 1.60 header
//!   layout, with presence gated by the stored BCD version word.
//! - Strict parsing: ident, end-of-file offset, BCD validation, reserved
//!   padding, offset ordering.
//! - Serialization that is the exact inverse of parsing for well-formed
//!   input.
//!
//! Notes
//!
//! The three file offsets the header stores (end-of-file, GD3, loop) are
//! kept in their on-disk self-relative form; use the `*_start` accessors
//! for absolute positions. A zero GD3 or loop offset means "none".
use crate::binutil::{
    ParseError, read_u8_at, read_u16_le_at, read_u32_le_at, write_u8, write_u16, write_u32,
};

/// Magic at the start of every VGM file.
pub const VGM_IDENT: [u8; 4] = *b"Vgm ";

/// File position the end-of-file offset is relative to.
pub const EOF_OFFSET_BASE: usize = 0x04;
/// File position the GD3 offset is relative to.
pub const GD3_OFFSET_BASE: usize = 0x14;
/// File position the loop offset is relative to.
pub const LOOP_OFFSET_BASE: usize = 0x1C;
/// File position the data offset is relative to.
pub const DATA_OFFSET_BASE: usize = 0x34;

/// Command data position for files that predate the data-offset field.
const LEGACY_DATA_START: usize = 0x40;
/// End of the version >= 1.51 field region.
const EXTENDED_FIELDS_END: usize = 0x7C;

/// Parsed VGM header. Field availability depends on `version`; fields a
/// file's version does not carry hold their documented defaults after
/// parsing and are not written back by [`VgmHeader::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmHeader {
    /// Stored end-of-file offset, relative to file position 0x04.
    pub eof_offset: u32,
    /// BCD version word, for example 0x00000150 for 1.50.
    pub version: u32,
    pub sn76489_clock: u32,
    pub ym2413_clock: u32,
    /// Stored GD3 offset, relative to 0x14; zero when the file has no tag.
    pub gd3_offset: u32,
    pub total_samples: u32,
    /// Stored loop offset, relative to 0x1C; zero when the file never loops.
    pub loop_offset: u32,
    pub loop_samples: u32,
    /// Recording rate in Hz (version 1.01 and later).
    pub rate: u32,
    /// SN76489 noise feedback pattern (version 1.10 and later).
    pub sn_feedback: u16,
    /// SN76489 shift register width in bits (version 1.10 and later).
    pub sn_shift_width: u8,
    pub sn_flags: u8,
    pub ym2612_clock: u32,
    pub ym2151_clock: u32,
    /// Stored data offset, relative to 0x34 (version 1.50 and later); zero
    /// selects the version's legacy data position.
    pub data_offset: u32,
    pub sega_pcm_clock: u32,
    pub sega_pcm_interface: u32,
    pub rf5c68_clock: u32,
    pub ym2203_clock: u32,
    pub ym2608_clock: u32,
    pub ym2610_clock: u32,
    pub ym3812_clock: u32,
    pub ym3526_clock: u32,
    pub y8950_clock: u32,
    pub ymf262_clock: u32,
    pub ymf271_clock: u32,
    pub ymz280b_clock: u32,
    pub rf5c164_clock: u32,
    pub pwm_clock: u32,
    pub ay8910_clock: u32,
    pub ay8910_type: u8,
    pub ay8910_flags: u8,
    pub ym2203_ay_flags: u8,
    pub ym2608_ay_flags: u8,
    /// Playback volume adjustment (version 1.60 and later).
    pub volume_modifier: u8,
    /// Loop play count base (version 1.60 and later).
    pub loop_base: u8,
    /// Loop play count modifier (version 1.51 and later).
    pub loop_modifier: u8,
}

impl Default for VgmHeader {
    fn default() -> Self {
        VgmHeader {
            eof_offset: 0,
            version: 0x0000_0150,
            sn76489_clock: 0,
            ym2413_clock: 0,
            gd3_offset: 0,
            total_samples: 0,
            loop_offset: 0,
            loop_samples: 0,
            rate: 0,
            sn_feedback: 0,
            sn_shift_width: 0,
            sn_flags: 0,
            ym2612_clock: 0,
            ym2151_clock: 0,
            data_offset: 0,
            sega_pcm_clock: 0,
            sega_pcm_interface: 0,
            rf5c68_clock: 0,
            ym2203_clock: 0,
            ym2608_clock: 0,
            ym2610_clock: 0,
            ym3812_clock: 0,
            ym3526_clock: 0,
            y8950_clock: 0,
            ymf262_clock: 0,
            ymf271_clock: 0,
            ymz280b_clock: 0,
            rf5c164_clock: 0,
            pwm_clock: 0,
            ay8910_clock: 0,
            ay8910_type: 0,
            ay8910_flags: 0,
            ym2203_ay_flags: 0,
            ym2608_ay_flags: 0,
            volume_modifier: 0,
            loop_base: 0,
            loop_modifier: 0,
        }
    }
}

/// Check that every nibble of a stored BCD word is a decimal digit.
fn is_valid_bcd(word: u32) -> bool {
    let mut v = word;
    while v != 0 {
        if v & 0xF > 9 {
            return false;
        }
        v >>= 4;
    }
    true
}

impl VgmHeader {
    /// Parse the header at the start of a complete VGM file image.
    ///
    /// `bytes` must be the whole file: the stored end-of-file offset is
    /// validated against `bytes.len()`. Reserved bytes between the last
    /// field the version defines and the start of command data must be
    /// zero.
    pub fn parse(bytes: &[u8]) -> Result<VgmHeader, ParseError> {
        if bytes.len() < LEGACY_DATA_START {
            return Err(ParseError::HeaderTooShort("VGM header".into()));
        }
        if bytes[0..4] != VGM_IDENT {
            let mut id: [u8; 4] = [0; 4];
            id.copy_from_slice(&bytes[0..4]);
            return Err(ParseError::InvalidIdent(id));
        }

        let eof_offset = read_u32_le_at(bytes, 0x04)?;
        let eof_abs = EOF_OFFSET_BASE + eof_offset as usize;
        if eof_abs != bytes.len() {
            return Err(ParseError::EofMismatch {
                header: eof_abs,
                actual: bytes.len(),
            });
        }

        let version = read_u32_le_at(bytes, 0x08)?;
        if !is_valid_bcd(version) {
            return Err(ParseError::InvalidBcd(version));
        }
        // Only major version 1 layouts are understood.
        if !(0x100..=0x1FF).contains(&version) {
            return Err(ParseError::UnsupportedVersion(version));
        }

        let mut header = VgmHeader {
            eof_offset,
            version,
            sn76489_clock: read_u32_le_at(bytes, 0x0C)?,
            ym2413_clock: read_u32_le_at(bytes, 0x10)?,
            gd3_offset: read_u32_le_at(bytes, 0x14)?,
            total_samples: read_u32_le_at(bytes, 0x18)?,
            loop_offset: read_u32_le_at(bytes, 0x1C)?,
            loop_samples: read_u32_le_at(bytes, 0x20)?,
            ..VgmHeader::default()
        };

        if version >= 0x101 {
            header.rate = read_u32_le_at(bytes, 0x24)?;
        }

        if version >= 0x110 {
            header.sn_feedback = read_u16_le_at(bytes, 0x28)?;
            header.sn_shift_width = read_u8_at(bytes, 0x2A)?;
            header.sn_flags = read_u8_at(bytes, 0x2B)?;
            header.ym2612_clock = read_u32_le_at(bytes, 0x2C)?;
            header.ym2151_clock = read_u32_le_at(bytes, 0x30)?;
        } else {
            // Before 1.10 every FM chip shared the YM2413 clock field and the
            // noise LFSR parameters were implied.
            header.ym2612_clock = header.ym2413_clock;
            header.ym2151_clock = header.ym2413_clock;
            header.sn_feedback = 0x0009;
            header.sn_shift_width = 16;
        }

        if version >= 0x150 {
            header.data_offset = read_u32_le_at(bytes, 0x34)?;
        }

        if version >= 0x151 {
            header.sega_pcm_clock = read_u32_le_at(bytes, 0x38)?;
            header.sega_pcm_interface = read_u32_le_at(bytes, 0x3C)?;
            header.rf5c68_clock = read_u32_le_at(bytes, 0x40)?;
            header.ym2203_clock = read_u32_le_at(bytes, 0x44)?;
            header.ym2608_clock = read_u32_le_at(bytes, 0x48)?;
            header.ym2610_clock = read_u32_le_at(bytes, 0x4C)?;
            header.ym3812_clock = read_u32_le_at(bytes, 0x50)?;
            header.ym3526_clock = read_u32_le_at(bytes, 0x54)?;
            header.y8950_clock = read_u32_le_at(bytes, 0x58)?;
            header.ymf262_clock = read_u32_le_at(bytes, 0x5C)?;
            header.ymf271_clock = read_u32_le_at(bytes, 0x60)?;
            header.ymz280b_clock = read_u32_le_at(bytes, 0x64)?;
            header.rf5c164_clock = read_u32_le_at(bytes, 0x68)?;
            header.pwm_clock = read_u32_le_at(bytes, 0x6C)?;
            header.ay8910_clock = read_u32_le_at(bytes, 0x70)?;
            header.ay8910_type = read_u8_at(bytes, 0x74)?;
            header.ay8910_flags = read_u8_at(bytes, 0x75)?;
            header.ym2203_ay_flags = read_u8_at(bytes, 0x76)?;
            header.ym2608_ay_flags = read_u8_at(bytes, 0x77)?;
            header.loop_modifier = read_u8_at(bytes, 0x7B)?;
        }

        if version >= 0x160 {
            header.volume_modifier = read_u8_at(bytes, 0x78)?;
            header.loop_base = read_u8_at(bytes, 0x7A)?;
            // 0x79 stays reserved.
            if read_u8_at(bytes, 0x79)? != 0 {
                return Err(ParseError::InvalidHeaderPadding { offset: 0x79 });
            }
        } else if version >= 0x151 {
            // The 1.60 byte slots exist on disk but must be untouched.
            for off in 0x78..0x7B {
                if read_u8_at(bytes, off)? != 0 {
                    return Err(ParseError::InvalidHeaderPadding { offset: off });
                }
            }
        }

        let fields_end = VgmHeader::fields_end_for_version(version);
        let data_start = header.data_start();
        if data_start < fields_end {
            return Err(ParseError::InvalidDataOffset {
                declared: data_start,
                minimum: fields_end,
            });
        }
        if data_start > bytes.len() {
            return Err(ParseError::OffsetOutOfRange {
                offset: data_start,
                needed: 1,
                available: bytes.len(),
                context: Some("data_offset".into()),
            });
        }
        for off in fields_end..data_start {
            if bytes[off] != 0 {
                return Err(ParseError::InvalidHeaderPadding { offset: off });
            }
        }

        if let Some(gd3_start) = header.gd3_start() {
            if gd3_start < data_start || gd3_start > bytes.len() {
                return Err(ParseError::OffsetOutOfRange {
                    offset: gd3_start,
                    needed: 1,
                    available: bytes.len(),
                    context: Some("gd3_offset".into()),
                });
            }
        }
        if let Some(loop_start) = header.loop_start()
            && loop_start > bytes.len()
        {
            return Err(ParseError::OffsetOutOfRange {
                offset: loop_start,
                needed: 1,
                available: bytes.len(),
                context: Some("loop_offset".into()),
            });
        }

        Ok(header)
    }

    /// Serialize the header region, exactly as long as the gap before the
    /// command data. Fields the stored version does not define are left as
    /// zero padding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = vec![0u8; self.data_start()];

        buf[0..4].copy_from_slice(&VGM_IDENT);
        write_u32(&mut buf, 0x04, self.eof_offset);
        write_u32(&mut buf, 0x08, self.version);
        write_u32(&mut buf, 0x0C, self.sn76489_clock);
        write_u32(&mut buf, 0x10, self.ym2413_clock);
        write_u32(&mut buf, 0x14, self.gd3_offset);
        write_u32(&mut buf, 0x18, self.total_samples);
        write_u32(&mut buf, 0x1C, self.loop_offset);
        write_u32(&mut buf, 0x20, self.loop_samples);

        if self.version >= 0x101 {
            write_u32(&mut buf, 0x24, self.rate);
        }
        if self.version >= 0x110 {
            write_u16(&mut buf, 0x28, self.sn_feedback);
            write_u8(&mut buf, 0x2A, self.sn_shift_width);
            write_u8(&mut buf, 0x2B, self.sn_flags);
            write_u32(&mut buf, 0x2C, self.ym2612_clock);
            write_u32(&mut buf, 0x30, self.ym2151_clock);
        }
        if self.version >= 0x150 {
            write_u32(&mut buf, 0x34, self.data_offset);
        }
        if self.version >= 0x151 {
            write_u32(&mut buf, 0x38, self.sega_pcm_clock);
            write_u32(&mut buf, 0x3C, self.sega_pcm_interface);
            write_u32(&mut buf, 0x40, self.rf5c68_clock);
            write_u32(&mut buf, 0x44, self.ym2203_clock);
            write_u32(&mut buf, 0x48, self.ym2608_clock);
            write_u32(&mut buf, 0x4C, self.ym2610_clock);
            write_u32(&mut buf, 0x50, self.ym3812_clock);
            write_u32(&mut buf, 0x54, self.ym3526_clock);
            write_u32(&mut buf, 0x58, self.y8950_clock);
            write_u32(&mut buf, 0x5C, self.ymf262_clock);
            write_u32(&mut buf, 0x60, self.ymf271_clock);
            write_u32(&mut buf, 0x64, self.ymz280b_clock);
            write_u32(&mut buf, 0x68, self.rf5c164_clock);
            write_u32(&mut buf, 0x6C, self.pwm_clock);
            write_u32(&mut buf, 0x70, self.ay8910_clock);
            write_u8(&mut buf, 0x74, self.ay8910_type);
            write_u8(&mut buf, 0x75, self.ay8910_flags);
            write_u8(&mut buf, 0x76, self.ym2203_ay_flags);
            write_u8(&mut buf, 0x77, self.ym2608_ay_flags);
            write_u8(&mut buf, 0x7B, self.loop_modifier);
        }
        if self.version >= 0x160 {
            write_u8(&mut buf, 0x78, self.volume_modifier);
            write_u8(&mut buf, 0x7A, self.loop_base);
        }

        buf
    }

    /// Byte offset just past the last field the given version defines.
    fn fields_end_for_version(version: u32) -> usize {
        match version {
            0x100 => 0x24,
            v if v < 0x110 => 0x28,
            v if v < 0x150 => 0x34,
            v if v < 0x151 => 0x38,
            _ => EXTENDED_FIELDS_END,
        }
    }

    /// Absolute file position where command data begins.
    pub fn data_start(&self) -> usize {
        if self.version < 0x150 {
            return LEGACY_DATA_START;
        }
        if self.data_offset == 0 {
            if self.version < 0x151 {
                LEGACY_DATA_START
            } else {
                EXTENDED_FIELDS_END
            }
        } else {
            DATA_OFFSET_BASE + self.data_offset as usize
        }
    }

    /// Absolute file position where the command stream must end: the GD3
    /// tag when one is present, otherwise the end of the file.
    pub fn data_end(&self) -> usize {
        self.gd3_start().unwrap_or_else(|| self.file_length())
    }

    /// Total file length implied by the stored end-of-file offset.
    pub fn file_length(&self) -> usize {
        EOF_OFFSET_BASE + self.eof_offset as usize
    }

    /// Absolute GD3 tag position, or `None` when the file has no tag.
    pub fn gd3_start(&self) -> Option<usize> {
        if self.gd3_offset == 0 {
            None
        } else {
            Some(GD3_OFFSET_BASE + self.gd3_offset as usize)
        }
    }

    /// Absolute loop position, or `None` when the file never loops.
    pub fn loop_start(&self) -> Option<usize> {
        if self.loop_offset == 0 {
            None
        } else {
            Some(LOOP_OFFSET_BASE + self.loop_offset as usize)
        }
    }

    /// Record the final file length into the end-of-file offset field.
    pub fn set_file_length(&mut self, len: usize) {
        self.eof_offset = (len - EOF_OFFSET_BASE) as u32;
    }

    /// Store an absolute GD3 position, or clear the field.
    pub fn set_gd3_start(&mut self, abs: Option<usize>) {
        self.gd3_offset = match abs {
            Some(a) => (a - GD3_OFFSET_BASE) as u32,
            None => 0,
        };
    }

    /// Store an absolute loop position, or clear the field.
    pub fn set_loop_start(&mut self, abs: Option<usize>) {
        self.loop_offset = match abs {
            Some(a) => (a - LOOP_OFFSET_BASE) as u32,
            None => 0,
        };
    }
}

/// Attempt to parse a complete VGM file image into its header.
impl TryFrom<&[u8]> for VgmHeader {
    type Error = ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        VgmHeader::parse(bytes)
    }
}
