//! Command stream decoder.
//!
//! [`CommandReader`] iterates the data region of a VGM file image and
//! yields one [`VgmCommand`] per opcode. Every payload shape is fully
//! determined by its opcode byte, so decoding is a single dispatch over
//! the tag with no lookahead.
//!
//! Two stream invariants are enforced:
//!
//! - A virtual [`VgmCommand::LoopPoint`] is yielded when the read offset
//!   equals the header's loop offset, preserving stream order. A loop
//!   offset that never lands on a command boundary is silently dropped.
//! - The offset just past the end-of-data marker must equal the expected
//!   end of the command stream (the GD3 tag start, or the end of the
//!   file). A marker arriving early is `TrailingBytes`; running out of
//!   data without one is `PrematureEnd`.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u24_le_at, read_u32_le_at};
use crate::vgm::command::{DataBlock, PcmRamWrite, VgmCommand};
use crate::vgm::header::VgmHeader;

/// Streaming decoder over the command data of a complete VGM file image.
///
/// Yields `Result<VgmCommand, ParseError>`; iteration ends after the
/// end-of-data marker or the first error.
pub struct CommandReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    end: usize,
    loop_at: Option<usize>,
    finished: bool,
}

impl<'a> CommandReader<'a> {
    /// Start decoding at the header's data offset. `bytes` must be the
    /// whole file the header was parsed from.
    pub fn new(bytes: &'a [u8], header: &VgmHeader) -> Self {
        CommandReader {
            bytes,
            offset: header.data_start(),
            end: header.data_end(),
            loop_at: header.loop_start(),
            finished: false,
        }
    }

    /// Absolute file offset of the next command.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn read_command(&mut self) -> Result<VgmCommand, ParseError> {
        let bytes = self.bytes;
        let opcode = read_u8_at(bytes, self.offset)?;
        let mut cur = self.offset + 1;
        let cmd = match opcode {
            0x4F => {
                let mask = read_u8_at(bytes, cur)?;
                cur += 1;
                VgmCommand::GameGearStereo(mask)
            }
            0x50 => {
                let value = read_u8_at(bytes, cur)?;
                cur += 1;
                VgmCommand::Sn76489Write(value)
            }
            0x51 => {
                let register = read_u8_at(bytes, cur)?;
                let value = read_u8_at(bytes, cur + 1)?;
                cur += 2;
                VgmCommand::Ym2413Write { register, value }
            }
            0x52 | 0x53 => {
                let register = read_u8_at(bytes, cur)?;
                let value = read_u8_at(bytes, cur + 1)?;
                cur += 2;
                VgmCommand::Ym2612Write {
                    port: opcode - 0x52,
                    register,
                    value,
                }
            }
            0x54 => {
                let register = read_u8_at(bytes, cur)?;
                let value = read_u8_at(bytes, cur + 1)?;
                cur += 2;
                VgmCommand::Ym2151Write { register, value }
            }
            0x55..=0x5F => {
                let address = read_u8_at(bytes, cur)?;
                let data = read_u8_at(bytes, cur + 1)?;
                cur += 2;
                VgmCommand::ReservedWrite {
                    opcode,
                    address,
                    data,
                }
            }
            0x61 => {
                let samples = read_u16_le_at(bytes, cur)?;
                cur += 2;
                VgmCommand::WaitSamples(samples)
            }
            0x62 => VgmCommand::Wait735Samples,
            0x63 => VgmCommand::Wait882Samples,
            0x66 => VgmCommand::EndOfData,
            0x67 => {
                let marker = read_u8_at(bytes, cur)?;
                let data_type = read_u8_at(bytes, cur + 1)?;
                let len = read_u32_le_at(bytes, cur + 2)? as usize;
                let data = read_slice(bytes, cur + 6, len)?.to_vec();
                cur += 6 + len;
                VgmCommand::DataBlock(DataBlock {
                    marker,
                    data_type,
                    data,
                })
            }
            0x68 => {
                let marker = read_u8_at(bytes, cur)?;
                let chip_type = read_u8_at(bytes, cur + 1)?;
                let read_offset = read_u24_le_at(bytes, cur + 2)?;
                let write_offset = read_u24_le_at(bytes, cur + 5)?;
                let size = read_u24_le_at(bytes, cur + 8)?;
                cur += 11;
                VgmCommand::PcmRamWrite(PcmRamWrite {
                    marker,
                    chip_type,
                    read_offset,
                    write_offset,
                    size,
                })
            }
            0x70..=0x7F => VgmCommand::WaitNSamples(opcode - 0x70 + 1),
            _ => {
                return Err(ParseError::UnknownOpcode {
                    opcode,
                    offset: self.offset,
                });
            }
        };
        if cur > self.end {
            return Err(ParseError::PrematureEnd {
                offset: cur,
                expected: self.end,
            });
        }
        self.offset = cur;
        Ok(cmd)
    }
}

impl Iterator for CommandReader<'_> {
    type Item = Result<VgmCommand, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.loop_at == Some(self.offset) {
            self.loop_at = None;
            return Some(Ok(VgmCommand::LoopPoint));
        }
        if self.offset >= self.end {
            self.finished = true;
            return Some(Err(ParseError::PrematureEnd {
                offset: self.offset,
                expected: self.end,
            }));
        }
        match self.read_command() {
            Ok(VgmCommand::EndOfData) => {
                self.finished = true;
                if self.offset != self.end {
                    Some(Err(ParseError::TrailingBytes {
                        offset: self.offset,
                        expected: self.end,
                    }))
                } else {
                    Some(Ok(VgmCommand::EndOfData))
                }
            }
            Ok(cmd) => Some(Ok(cmd)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode the whole command stream into a vector, ending with
/// [`VgmCommand::EndOfData`].
pub fn decode_commands(bytes: &[u8], header: &VgmHeader) -> Result<Vec<VgmCommand>, ParseError> {
    CommandReader::new(bytes, header).collect()
}
