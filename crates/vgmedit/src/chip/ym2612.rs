//! YM2612 (OPN2) register state.
//!
//! The editor stores raw bytes per port under a validity mask and derives
//! no further semantics from them; timer and LFO interpretation is a
//! display concern that lives outside the editing engines.

/// True for register addresses the chip implements on the given port.
pub fn is_valid_register(port: u8, register: u8) -> bool {
    match register {
        0x22 | 0x24..=0x28 | 0x2A | 0x2B => port == 0,
        0x30..=0x9F => true,
        0xA0..=0xB6 => register & 0x03 != 0x03,
        _ => false,
    }
}

/// Raw per-port YM2612 register file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ym2612State {
    ports: [[u8; 0x100]; 2],
}

impl Default for Ym2612State {
    fn default() -> Self {
        Ym2612State {
            ports: [[0; 0x100]; 2],
        }
    }
}

impl Ym2612State {
    pub fn new() -> Self {
        Ym2612State::default()
    }

    /// Store a register write; invalid addresses are ignored. Returns
    /// whether the write took effect.
    pub fn write(&mut self, port: u8, register: u8, value: u8) -> bool {
        if port > 1 || !is_valid_register(port, register) {
            return false;
        }
        self.ports[port as usize][register as usize] = value;
        true
    }

    /// Current register value; invalid addresses read as zero.
    pub fn read(&self, port: u8, register: u8) -> u8 {
        if port > 1 || !is_valid_register(port, register) {
            return 0;
        }
        self.ports[port as usize][register as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_mask() {
        assert!(is_valid_register(0, 0x22));
        assert!(is_valid_register(0, 0x2A));
        assert!(!is_valid_register(1, 0x2A));
        assert!(is_valid_register(1, 0x30));
        assert!(is_valid_register(0, 0xB6));
        assert!(!is_valid_register(0, 0xA3));
        assert!(!is_valid_register(0, 0xB7));
        assert!(!is_valid_register(0, 0x00));
    }

    #[test]
    fn writes_respect_mask() {
        let mut state = Ym2612State::new();
        assert!(state.write(0, 0x2A, 0x80));
        assert_eq!(state.read(0, 0x2A), 0x80);
        assert!(!state.write(1, 0x2A, 0x80));
        assert_eq!(state.read(1, 0x2A), 0);
        assert!(state.write(1, 0xA0, 0x44));
        assert_eq!(state.read(1, 0xA0), 0x44);
    }
}
