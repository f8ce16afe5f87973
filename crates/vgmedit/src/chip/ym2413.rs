//! YM2413 (OPLL) register state.
//!
//! The chip decodes 0x39 register addresses but only a documented subset
//! is real; the rest read as zero and ignore writes. Nine tone channels
//! each carry an F-number split across `0x10+ch` (low 8 bits) and
//! `0x20+ch` (high bit, block, sustain and the key bit); `0x0E` holds the
//! 5-bit rhythm/percussion register.

/// One past the highest decoded register address.
pub const REGISTER_COUNT: usize = 0x39;
/// Key-on bit in the `0x20..=0x28` channel registers.
pub const KEY_BIT: u8 = 0x10;
/// Rhythm mode register address.
pub const RHYTHM_REGISTER: u8 = 0x0E;
/// Percussion key bits within the rhythm register.
pub const RHYTHM_MASK: u8 = 0x1F;
/// Number of tone channels.
pub const CHANNELS: usize = 9;

/// True for register addresses the chip actually implements.
pub fn is_valid_register(register: u8) -> bool {
    matches!(
        register,
        0x00..=0x07 | 0x0E | 0x0F | 0x10..=0x18 | 0x20..=0x28 | 0x30..=0x38
    )
}

/// Ascending iterator over every implemented register address.
pub fn valid_registers() -> impl Iterator<Item = u8> {
    (0..REGISTER_COUNT as u8).filter(|r| is_valid_register(*r))
}

/// Tone channel index for a key register address, if it is one.
pub fn key_channel(register: u8) -> Option<usize> {
    if (0x20..=0x28).contains(&register) {
        Some((register - 0x20) as usize)
    } else {
        None
    }
}

/// Clear the key / percussion bits of a register value. Used for loop
/// snapshots, which resume mid-note: key edges were already handled at
/// the start snapshot.
pub fn mask_key_bits(register: u8, value: u8) -> u8 {
    match register {
        RHYTHM_REGISTER => value & !RHYTHM_MASK,
        0x20..=0x28 => value & !KEY_BIT,
        _ => value,
    }
}

/// Tracked YM2413 register file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ym2413State {
    registers: [u8; REGISTER_COUNT],
}

impl Default for Ym2413State {
    fn default() -> Self {
        Ym2413State {
            registers: [0; REGISTER_COUNT],
        }
    }
}

impl Ym2413State {
    pub fn new() -> Self {
        Ym2413State::default()
    }

    /// Store a register write. Writes to unimplemented addresses are
    /// ignored; the return value reports whether the write took effect.
    pub fn write(&mut self, register: u8, value: u8) -> bool {
        if !is_valid_register(register) {
            return false;
        }
        self.registers[register as usize] = value;
        true
    }

    /// Current register value; unimplemented addresses read as zero.
    pub fn read(&self, register: u8) -> u8 {
        if is_valid_register(register) {
            self.registers[register as usize]
        } else {
            0
        }
    }

    /// Key bit of a tone channel (0..=8).
    pub fn key(&self, channel: usize) -> bool {
        self.registers[0x20 + channel] & KEY_BIT != 0
    }

    /// The five percussion key bits.
    pub fn rhythm(&self) -> u8 {
        self.registers[RHYTHM_REGISTER as usize] & RHYTHM_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_registers_read_zero_and_ignore_writes() {
        let mut state = Ym2413State::new();
        assert!(!state.write(0x08, 0x7F));
        assert!(!state.write(0x19, 0x7F));
        assert_eq!(state.read(0x08), 0);
        assert!(state.write(0x07, 0x7F));
        assert_eq!(state.read(0x07), 0x7F);
    }

    #[test]
    fn key_bits() {
        let mut state = Ym2413State::new();
        state.write(0x24, 0x10 | 0x02);
        assert!(state.key(4));
        assert_eq!(key_channel(0x24), Some(4));
        assert_eq!(key_channel(0x10), None);
        state.write(0x24, 0x02);
        assert!(!state.key(4));
    }

    #[test]
    fn rhythm_and_masking() {
        let mut state = Ym2413State::new();
        state.write(RHYTHM_REGISTER, 0x35);
        assert_eq!(state.rhythm(), 0x15);
        assert_eq!(mask_key_bits(RHYTHM_REGISTER, 0x35), 0x20);
        assert_eq!(mask_key_bits(0x20, 0x1F), 0x0F);
        assert_eq!(mask_key_bits(0x10, 0xFF), 0xFF);
    }

    #[test]
    fn valid_register_walk_is_ascending() {
        let regs: Vec<u8> = valid_registers().collect();
        assert_eq!(regs.len(), 8 + 2 + 9 + 9 + 9);
        assert!(regs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*regs.last().unwrap(), 0x38);
    }
}
