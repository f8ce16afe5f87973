//! SN76489 PSG register state.
//!
//! The PSG exposes eight 4-to-10-bit registers behind a latch-based
//! single-byte interface:
//!
//! - Latch byte (bit 7 set): bits 6-4 select the register, bits 3-0
//!   replace its low nibble.
//! - Data byte (bit 7 clear): replaces the high 6 bits of the latched
//!   register when it is a tone register, otherwise its low nibble.
//!
//! Register layout: `0/2/4` tone periods (10-bit), `1/3/5` tone
//! attenuations, `6` noise control, `7` noise attenuation. Attenuation
//! `0xF` is silence. Writing the noise register resets the chip's shift
//! register even when the value is unchanged, so downstream writers must
//! treat noise writes as always effectful rather than value-diffing them.

/// Tone channels plus the noise channel.
pub const PSG_CHANNELS: usize = 4;
/// Channel index of the noise generator.
pub const NOISE_CHANNEL: usize = 3;
/// Attenuation value that fully silences a channel.
pub const MAX_ATTENUATION: u8 = 0x0F;
/// 10-bit tone periods below this are above the audible range at the
/// standard 3.58 MHz clock and can be silenced outright.
pub const SILENCE_CUTOFF: u16 = 6;

/// Tracked PSG register file, latch index and Game Gear stereo mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsgState {
    /// Tone registers hold 10-bit periods, the rest hold 4-bit values.
    registers: [u16; 8],
    latched: u8,
    stereo: u8,
}

impl Default for PsgState {
    fn default() -> Self {
        // Power-on defaults: zero periods, every channel attenuated to
        // silence, all channels on both Game Gear outputs.
        PsgState {
            registers: [0, 0xF, 0, 0xF, 0, 0xF, 0, 0xF],
            latched: 0,
            stereo: 0xFF,
        }
    }
}

fn is_tone_register(register: u8) -> bool {
    register % 2 == 0 && register < 5
}

impl PsgState {
    pub fn new() -> Self {
        PsgState::default()
    }

    /// Apply one byte written to the chip and return the index of the
    /// register it landed in.
    pub fn write(&mut self, value: u8) -> u8 {
        if value & 0x80 != 0 {
            let register = (value >> 4) & 0x07;
            self.latched = register;
            let r = register as usize;
            if is_tone_register(register) {
                self.registers[r] = (self.registers[r] & 0x3F0) | u16::from(value & 0x0F);
            } else {
                self.registers[r] = u16::from(value & 0x0F);
            }
            register
        } else {
            let r = self.latched as usize;
            if is_tone_register(self.latched) {
                self.registers[r] = (self.registers[r] & 0x00F) | (u16::from(value & 0x3F) << 4);
            } else {
                self.registers[r] = u16::from(value & 0x0F);
            }
            self.latched
        }
    }

    /// 10-bit period of a tone channel (0..=2).
    pub fn tone(&self, channel: usize) -> u16 {
        self.registers[channel * 2]
    }

    /// Attenuation of any channel (0..=3), `0xF` = silent.
    pub fn volume(&self, channel: usize) -> u8 {
        let r = if channel < NOISE_CHANNEL { channel * 2 + 1 } else { 7 };
        self.registers[r] as u8
    }

    /// Noise control register value.
    pub fn noise(&self) -> u8 {
        self.registers[6] as u8
    }

    /// Index of the currently latched register.
    pub fn latched_register(&self) -> u8 {
        self.latched
    }

    pub fn stereo(&self) -> u8 {
        self.stereo
    }

    pub fn set_stereo(&mut self, mask: u8) {
        self.stereo = mask;
    }

    /// True when the noise control selects channel 2's period as its
    /// pitch source, repurposing the tone register as a noise control.
    pub fn noise_uses_channel2(&self) -> bool {
        self.registers[6] & 0x03 == 0x03
    }
}

fn latch_byte(register: u8, low: u8) -> u8 {
    0x80 | ((register & 0x07) << 4) | (low & 0x0F)
}

/// Latch/data byte pair that programs a tone channel's full 10-bit period.
pub fn tone_bytes(channel: usize, value: u16) -> [u8; 2] {
    [
        latch_byte((channel * 2) as u8, (value & 0x0F) as u8),
        ((value >> 4) & 0x3F) as u8,
    ]
}

/// Latch byte that sets a channel's attenuation.
pub fn volume_byte(channel: usize, attenuation: u8) -> u8 {
    let register = if channel < NOISE_CHANNEL { channel * 2 + 1 } else { 7 };
    latch_byte(register as u8, attenuation)
}

/// Latch byte that programs the noise control register.
pub fn noise_byte(value: u8) -> u8 {
    latch_byte(6, value)
}
