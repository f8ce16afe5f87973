//! Chip register-state tracking used by the editing engines.
//!
//! [`SystemState`] aggregates one tracker per interpreted chip plus a
//! running sample counter and per-chip usage flags. A fresh state is
//! created for every trim/optimize/convert pass and discarded with it.
pub mod psg;
pub mod ym2413;
pub mod ym2612;

pub use psg::PsgState;
pub use ym2413::Ym2413State;
pub use ym2612::Ym2612State;

use crate::vgm::command::VgmCommand;

/// Aggregate chip state for one editing pass over one file.
///
/// The usage flags record whether a chip occurs *anywhere* in the file
/// (filled in by a preliminary scan); they decide whether full-state
/// snapshots for that chip are worth emitting at all. YM2151 and the
/// reserved opcode ranges are never interpreted, only flagged.
#[derive(Debug, Clone, Default)]
pub struct SystemState {
    pub psg: PsgState,
    pub ym2413: Ym2413State,
    pub ym2612: Ym2612State,
    /// Samples elapsed since the start of the stream.
    pub sample_count: u64,
    pub uses_psg: bool,
    pub uses_ym2413: bool,
    pub uses_ym2612: bool,
    pub uses_reserved: bool,
}

impl SystemState {
    pub fn new() -> Self {
        SystemState::default()
    }

    /// Copy another state's usage flags, typically from a completed
    /// whole-file scan, into this fresh state.
    pub fn adopt_usage(&mut self, scanned: &SystemState) {
        self.uses_psg = scanned.uses_psg;
        self.uses_ym2413 = scanned.uses_ym2413;
        self.uses_ym2612 = scanned.uses_ym2612;
        self.uses_reserved = scanned.uses_reserved;
    }

    /// Apply one decoded command: advance time for waits, update register
    /// state and usage flags for chip writes.
    pub fn apply(&mut self, command: &VgmCommand) {
        match command {
            VgmCommand::GameGearStereo(mask) => {
                self.uses_psg = true;
                self.psg.set_stereo(*mask);
            }
            VgmCommand::Sn76489Write(value) => {
                self.uses_psg = true;
                self.psg.write(*value);
            }
            VgmCommand::Ym2413Write { register, value } => {
                self.uses_ym2413 = true;
                self.ym2413.write(*register, *value);
            }
            VgmCommand::Ym2612Write {
                port,
                register,
                value,
            } => {
                self.uses_ym2612 = true;
                self.ym2612.write(*port, *register, *value);
            }
            VgmCommand::Ym2151Write { .. } | VgmCommand::ReservedWrite { .. } => {
                self.uses_reserved = true;
            }
            _ => {
                self.sample_count += u64::from(command.wait_samples());
            }
        }
    }
}
