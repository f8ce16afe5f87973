//! GYM / SSL / CYM → VGM conversion.
//!
//! The sibling trace formats are flat opcode streams logged once per
//! 1/60 s frame. Each converter reads one source opcode at a time,
//! re-emits the corresponding VGM opcode, stamps the header clock of a
//! chip on its first use and counts one frame per wait.
//!
//! GYM is the only format with structure of its own: an optional
//! 428-byte "GYMX" extended header carrying a 1-based loop-frame marker
//! and a compressed-data flag (compressed files cannot be converted),
//! and batched YM2612 DAC writes that need spreading. GYM logs any
//! number of DAC samples before a single end-of-frame wait; VGM needs
//! one wait per sample. The spreading pass counts the DAC writes of the
//! run, then re-emits each followed by a pause of
//! `frame * (i + 1) / n - frame * i / n` samples, which sums to exactly
//! one frame and absorbs the wait that terminated it.
use std::fmt;

use crate::binutil::{ParseError, read_u8_at, read_u32_le_at};
use crate::vgm::command::{NTSC_FRAME_SAMPLES, encode_wait};
use crate::vgm::header::VgmHeader;

/// Clock stamped for the YM2612 and YM2151, derived from the Mega Drive
/// master clock.
pub const FM_CLOCK: u32 = 7_670_454;
/// Clock stamped for the PSG and YM2413.
pub const PSG_CLOCK: u32 = 3_579_545;

/// Size of the optional GYMX extended header.
const GYMX_HEADER_SIZE: usize = 428;
/// Offset of the 1-based loop-frame marker within the GYMX header.
const GYMX_LOOP_OFFSET: usize = 420;
/// Offset of the packed-size word; nonzero means compressed data.
const GYMX_PACKED_OFFSET: usize = 424;

/// Everything that can stop a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    Parse(ParseError),
    /// The GYMX header's compressed flag is set; this format variant
    /// cannot be converted.
    UnsupportedCompressedGym,
    /// The file extension matches none of the convertible formats.
    UnrecognizedExtension(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Parse(e) => write!(f, "{}", e),
            ConvertError::UnsupportedCompressedGym => {
                write!(f, "GYMX file is compressed and cannot be converted")
            }
            ConvertError::UnrecognizedExtension(ext) => {
                write!(f, "unrecognized trace format extension: {:?}", ext)
            }
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<ParseError> for ConvertError {
    fn from(e: ParseError) -> Self {
        ConvertError::Parse(e)
    }
}

/// The convertible source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    Gym,
    Ssl,
    Cym,
}

impl TraceFormat {
    /// Map a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<TraceFormat> {
        if ext.eq_ignore_ascii_case("gym") {
            Some(TraceFormat::Gym)
        } else if ext.eq_ignore_ascii_case("ssl") {
            Some(TraceFormat::Ssl)
        } else if ext.eq_ignore_ascii_case("cym") {
            Some(TraceFormat::Cym)
        } else {
            None
        }
    }
}

/// Header template plus data buffer shared by the three converters.
struct Output {
    header: VgmHeader,
    data: Vec<u8>,
    total_samples: u64,
    loop_at: Option<usize>,
}

impl Output {
    fn new() -> Self {
        Output {
            header: VgmHeader {
                version: 0x0000_0110,
                rate: 60,
                ..VgmHeader::default()
            },
            data: Vec::new(),
            total_samples: 0,
            loop_at: None,
        }
    }

    fn stamp_psg(&mut self) {
        if self.header.sn76489_clock == 0 {
            self.header.sn76489_clock = PSG_CLOCK;
            self.header.sn_feedback = 0x0009;
            self.header.sn_shift_width = 16;
        }
    }

    fn stamp_ym2413(&mut self) {
        if self.header.ym2413_clock == 0 {
            self.header.ym2413_clock = PSG_CLOCK;
        }
    }

    fn stamp_ym2612(&mut self) {
        if self.header.ym2612_clock == 0 {
            self.header.ym2612_clock = FM_CLOCK;
        }
    }

    fn stamp_ym2151(&mut self) {
        if self.header.ym2151_clock == 0 {
            self.header.ym2151_clock = FM_CLOCK;
        }
    }

    fn frame_wait(&mut self) {
        self.data.push(0x62);
        self.total_samples += u64::from(NTSC_FRAME_SAMPLES);
    }

    fn finish(mut self, loop_frame: Option<u64>) -> Vec<u8> {
        self.data.push(0x66);
        self.header.total_samples = self.total_samples as u32;
        let data_start = self.header.data_start();
        if let (Some(off), Some(frame)) = (self.loop_at, loop_frame) {
            self.header.set_loop_start(Some(data_start + off));
            self.header.loop_samples =
                (self.total_samples - frame * u64::from(NTSC_FRAME_SAMPLES)) as u32;
        }
        self.header.set_file_length(data_start + self.data.len());
        let mut out = self.header.to_bytes();
        out.extend_from_slice(&self.data);
        out
    }
}

/// Convert a trace file image of the given format into a VGM file image.
pub fn convert(format: TraceFormat, bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    match format {
        TraceFormat::Gym => convert_gym(bytes),
        TraceFormat::Ssl => convert_ssl(bytes),
        TraceFormat::Cym => convert_cym(bytes),
    }
}

fn convert_gym(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let mut off = 0;
    let mut loop_frame: Option<u64> = None;
    if bytes.len() >= GYMX_HEADER_SIZE && &bytes[0..4] == b"GYMX" {
        if read_u32_le_at(bytes, GYMX_PACKED_OFFSET)? != 0 {
            return Err(ConvertError::UnsupportedCompressedGym);
        }
        let marker = read_u32_le_at(bytes, GYMX_LOOP_OFFSET)?;
        if marker != 0 {
            loop_frame = Some(u64::from(marker) - 1);
        }
        off = GYMX_HEADER_SIZE;
    }

    let mut out = Output::new();
    let mut frames: u64 = 0;
    while off < bytes.len() {
        if loop_frame == Some(frames) && out.loop_at.is_none() {
            out.loop_at = Some(out.data.len());
        }
        let opcode = bytes[off];
        off += 1;
        match opcode {
            0x00 => out.frame_wait(),
            0x01 => {
                let address = read_u8_at(bytes, off)?;
                let data = read_u8_at(bytes, off + 1)?;
                off += 2;
                out.stamp_ym2612();
                if address == 0x2A {
                    let (next, frame_elapsed) = spread_dac_run(bytes, off, data, &mut out)?;
                    off = next;
                    if frame_elapsed {
                        frames += 1;
                    }
                    continue;
                }
                out.data.extend_from_slice(&[0x52, address, data]);
            }
            0x02 => {
                let address = read_u8_at(bytes, off)?;
                let data = read_u8_at(bytes, off + 1)?;
                off += 2;
                out.stamp_ym2612();
                out.data.extend_from_slice(&[0x53, address, data]);
            }
            0x03 => {
                let data = read_u8_at(bytes, off)?;
                off += 1;
                out.stamp_psg();
                out.data.extend_from_slice(&[0x50, data]);
            }
            _ => {
                return Err(ParseError::UnknownOpcode {
                    opcode,
                    offset: off - 1,
                }
                .into());
            }
        }
        if opcode == 0x00 {
            frames += 1;
        }
    }
    Ok(out.finish(loop_frame))
}

/// Spread one GYM DAC run across its frame.
///
/// Called with the first DAC write already consumed (`first` is its data
/// byte, `off` points past it). Pass one counts the DAC writes up to the
/// terminating frame wait; pass two re-emits every command of the run in
/// order, following each DAC write with its share of the frame. The
/// synthesized pauses replace the terminating wait, which is consumed
/// without being emitted. A run cut short by end-of-file has no wait to
/// absorb, so its writes are emitted back to back instead.
///
/// Returns the source offset just past the run and whether a frame wait
/// was absorbed.
fn spread_dac_run(
    bytes: &[u8],
    off: usize,
    first: u8,
    out: &mut Output,
) -> Result<(usize, bool), ConvertError> {
    // Pass one: count DAC writes until the frame wait.
    let mut n: u64 = 1;
    let mut cur = off;
    let mut ends_with_wait = false;
    while cur < bytes.len() {
        match bytes[cur] {
            0x00 => {
                ends_with_wait = true;
                break;
            }
            0x01 | 0x02 => {
                if bytes[cur] == 0x01 && read_u8_at(bytes, cur + 1)? == 0x2A {
                    n += 1;
                }
                read_u8_at(bytes, cur + 2)?;
                cur += 3;
            }
            0x03 => {
                read_u8_at(bytes, cur + 1)?;
                cur += 2;
            }
            opcode => {
                return Err(ParseError::UnknownOpcode {
                    opcode,
                    offset: cur,
                }
                .into());
            }
        }
    }

    let frame = u64::from(NTSC_FRAME_SAMPLES);
    let mut emit_dac = |out: &mut Output, i: u64, data: u8| {
        out.data.extend_from_slice(&[0x52, 0x2A, data]);
        if ends_with_wait {
            encode_wait(&mut out.data, frame * (i + 1) / n - frame * i / n);
        }
    };

    // Pass two: re-emit the run from the first DAC byte.
    emit_dac(out, 0, first);
    let mut i: u64 = 1;
    let mut cur = off;
    loop {
        if cur >= bytes.len() {
            break;
        }
        match bytes[cur] {
            0x00 => {
                cur += 1;
                break;
            }
            0x01 => {
                let address = bytes[cur + 1];
                let data = bytes[cur + 2];
                cur += 3;
                if address == 0x2A {
                    emit_dac(out, i, data);
                    i += 1;
                } else {
                    out.data.extend_from_slice(&[0x52, address, data]);
                }
            }
            0x02 => {
                out.data.extend_from_slice(&[0x53, bytes[cur + 1], bytes[cur + 2]]);
                cur += 3;
            }
            0x03 => {
                out.stamp_psg();
                out.data.extend_from_slice(&[0x50, bytes[cur + 1]]);
                cur += 2;
            }
            _ => unreachable!("validated in the counting pass"),
        }
    }
    if ends_with_wait {
        out.total_samples += frame;
    }
    Ok((cur, ends_with_wait))
}

fn convert_ssl(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let mut out = Output::new();
    let mut latched: u8 = 0;
    let mut off = 0;
    while off < bytes.len() {
        let opcode = bytes[off];
        off += 1;
        match opcode {
            0x00 => out.frame_wait(),
            0x03 => {
                let data = read_u8_at(bytes, off)?;
                off += 1;
                out.stamp_psg();
                out.data.extend_from_slice(&[0x50, data]);
            }
            0x04 => {
                let mask = read_u8_at(bytes, off)?;
                off += 1;
                out.stamp_psg();
                out.data.extend_from_slice(&[0x4F, mask]);
            }
            0x05 => {
                latched = read_u8_at(bytes, off)?;
                off += 1;
            }
            0x06 => {
                let data = read_u8_at(bytes, off)?;
                off += 1;
                out.stamp_ym2413();
                out.data.extend_from_slice(&[0x51, latched, data]);
            }
            _ => {
                return Err(ParseError::UnknownOpcode {
                    opcode,
                    offset: off - 1,
                }
                .into());
            }
        }
    }
    Ok(out.finish(None))
}

fn convert_cym(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let mut out = Output::new();
    let mut off = 0;
    while off < bytes.len() {
        let opcode = bytes[off];
        off += 1;
        if opcode == 0x00 {
            out.frame_wait();
        } else {
            // Any non-wait byte is a YM2151 register address followed by
            // its data byte.
            let data = read_u8_at(bytes, off)?;
            off += 1;
            out.stamp_ym2151();
            out.data.extend_from_slice(&[0x54, opcode, data]);
        }
    }
    Ok(out.finish(None))
}
