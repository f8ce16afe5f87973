//! Typed VGM commands and their wire encoding.
//!
//! Contents
//!
//! - [`VgmCommand`]: one variant per opcode kind the editor understands,
//!   plus the virtual [`VgmCommand::LoopPoint`] marker that only exists in
//!   decoded streams.
//! - [`encode_wait`]: the minimal multi-opcode encoding of a pause length.
//!
//! Notes
//!
//! Every payload shape is fully determined by the opcode byte, so encoding
//! and decoding are both straight tables. Reserved chip opcodes
//! (0x55..=0x5F) are carried opaquely and re-emitted byte for byte.

/// Sample count of the fixed NTSC frame wait (opcode 0x62, 1/60 s).
pub const NTSC_FRAME_SAMPLES: u16 = 735;
/// Sample count of the fixed PAL frame wait (opcode 0x63, 1/50 s).
pub const PAL_FRAME_SAMPLES: u16 = 882;
/// Largest pause a single word wait (opcode 0x61) can express.
pub const MAX_WORD_WAIT: u16 = 0xFFFF;

/// Opaque data block (opcode 0x67).
///
/// The block is carried verbatim; the editor never interprets its
/// contents. `marker` is the 0x66 compatibility byte that follows the
/// opcode on the wire and is preserved as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub marker: u8,
    pub data_type: u8,
    pub data: Vec<u8>,
}

/// PCM RAM transfer request (opcode 0x68). Fixed-size fields, carried
/// opaquely; the three offsets are 24-bit little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmRamWrite {
    pub marker: u8,
    pub chip_type: u8,
    pub read_offset: u32,
    pub write_offset: u32,
    pub size: u32,
}

/// A decoded VGM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VgmCommand {
    /// 0x4F: Game Gear stereo mask for the PSG.
    GameGearStereo(u8),
    /// 0x50: SN76489 PSG write (latch or data byte).
    Sn76489Write(u8),
    /// 0x51: YM2413 register write.
    Ym2413Write { register: u8, value: u8 },
    /// 0x52 (port 0) / 0x53 (port 1): YM2612 register write.
    Ym2612Write { port: u8, register: u8, value: u8 },
    /// 0x54: YM2151 register write, passed through uninterpreted.
    Ym2151Write { register: u8, value: u8 },
    /// 0x55..=0x5F: reserved chip ranges, two payload bytes, opaque.
    ReservedWrite { opcode: u8, address: u8, data: u8 },
    /// 0x61: wait an explicit number of samples.
    WaitSamples(u16),
    /// 0x62: wait one NTSC frame (735 samples).
    Wait735Samples,
    /// 0x63: wait one PAL frame (882 samples).
    Wait882Samples,
    /// 0x70..=0x7F: short wait; holds the decoded count, 1..=16.
    WaitNSamples(u8),
    /// 0x67: opaque data block.
    DataBlock(DataBlock),
    /// 0x68: PCM RAM transfer.
    PcmRamWrite(PcmRamWrite),
    /// 0x66: end of the command stream.
    EndOfData,
    /// Synthesized where the header's loop offset points; never on the wire.
    LoopPoint,
}

impl VgmCommand {
    /// Number of samples this command advances playback time by.
    pub fn wait_samples(&self) -> u32 {
        match self {
            VgmCommand::WaitSamples(n) => *n as u32,
            VgmCommand::Wait735Samples => NTSC_FRAME_SAMPLES as u32,
            VgmCommand::Wait882Samples => PAL_FRAME_SAMPLES as u32,
            VgmCommand::WaitNSamples(n) => *n as u32,
            _ => 0,
        }
    }

    /// True for the four pure wait commands, including a zero-length word
    /// wait.
    pub fn is_wait(&self) -> bool {
        matches!(
            self,
            VgmCommand::WaitSamples(_)
                | VgmCommand::Wait735Samples
                | VgmCommand::Wait882Samples
                | VgmCommand::WaitNSamples(_)
        )
    }

    /// Append this command's wire encoding to `out`.
    ///
    /// [`VgmCommand::LoopPoint`] has no wire form and appends nothing.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            VgmCommand::GameGearStereo(mask) => out.extend_from_slice(&[0x4F, *mask]),
            VgmCommand::Sn76489Write(value) => out.extend_from_slice(&[0x50, *value]),
            VgmCommand::Ym2413Write { register, value } => {
                out.extend_from_slice(&[0x51, *register, *value]);
            }
            VgmCommand::Ym2612Write {
                port,
                register,
                value,
            } => {
                out.extend_from_slice(&[0x52 + port, *register, *value]);
            }
            VgmCommand::Ym2151Write { register, value } => {
                out.extend_from_slice(&[0x54, *register, *value]);
            }
            VgmCommand::ReservedWrite {
                opcode,
                address,
                data,
            } => {
                out.extend_from_slice(&[*opcode, *address, *data]);
            }
            VgmCommand::WaitSamples(n) => {
                out.push(0x61);
                out.extend_from_slice(&n.to_le_bytes());
            }
            VgmCommand::Wait735Samples => out.push(0x62),
            VgmCommand::Wait882Samples => out.push(0x63),
            VgmCommand::WaitNSamples(n) => out.push(0x70 + (n - 1)),
            VgmCommand::DataBlock(block) => {
                out.push(0x67);
                out.push(block.marker);
                out.push(block.data_type);
                out.extend_from_slice(&(block.data.len() as u32).to_le_bytes());
                out.extend_from_slice(&block.data);
            }
            VgmCommand::PcmRamWrite(pr) => {
                out.push(0x68);
                out.push(pr.marker);
                out.push(pr.chip_type);
                out.extend_from_slice(&pr.read_offset.to_le_bytes()[..3]);
                out.extend_from_slice(&pr.write_offset.to_le_bytes()[..3]);
                out.extend_from_slice(&pr.size.to_le_bytes()[..3]);
            }
            VgmCommand::EndOfData => out.push(0x66),
            VgmCommand::LoopPoint => {}
        }
    }
}

/// Append the minimal opcode sequence for a pause of `samples` samples.
///
/// Encoding preference, after splitting off full-width word waits while
/// the remainder exceeds 65535: exact single or double NTSC/PAL frame
/// lengths as fixed-frame opcodes, then one short wait for 1..=16, then a
/// word wait. A zero-length pause emits nothing.
pub fn encode_wait(out: &mut Vec<u8>, samples: u64) {
    let mut left = samples;
    while left > MAX_WORD_WAIT as u64 {
        out.extend_from_slice(&[0x61, 0xFF, 0xFF]);
        left -= MAX_WORD_WAIT as u64;
    }
    let ntsc = NTSC_FRAME_SAMPLES as u64;
    let pal = PAL_FRAME_SAMPLES as u64;
    match left {
        0 => {}
        n if n == ntsc => out.push(0x62),
        n if n == ntsc * 2 => out.extend_from_slice(&[0x62, 0x62]),
        n if n == pal => out.push(0x63),
        n if n == pal * 2 => out.extend_from_slice(&[0x63, 0x63]),
        1..=16 => out.push(0x70 + (left as u8 - 1)),
        n => {
            out.push(0x61);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
    }
}
