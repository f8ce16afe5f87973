//! Per-pass output encoder.
//!
//! [`EncoderContext`] owns the output buffer of one trim or optimize pass
//! and implements the write-gating rules of the optimization engine:
//!
//! - PSG and YM2413 writes arriving between two waits form one merge
//!   window. Their net effect is flushed as a minimal diff against the
//!   last-written register shadow when the window closes.
//! - The PSG noise register is re-flushed on every window in which it was
//!   written, even when the value is unchanged: the hardware resets its
//!   shift register on every write.
//! - A YM2413 key or percussion bit that leaves and returns to its
//!   last-written set state within one window ("DUD") is re-emitted as an
//!   explicit key-off / key-on pair to force the retrigger the net diff
//!   would otherwise drop.
//! - Accumulated pauses are written, minimally encoded, immediately
//!   before any data write and at stream end. Loop offsets are only ever
//!   recorded at such flush points, so they always land on a command
//!   boundary.
//! - With offset removal enabled, tone channels whose period drops below
//!   the audibility cutoff are force-silenced (at most one
//!   max-attenuation write and one zero-period write per episode) and
//!   restored when the period comes back up.
//!
//! A context is created fresh per pass and never shared; the chip state
//! being read from the source is threaded in by the caller.
use crate::chip::{SystemState, psg, ym2413};
use crate::vgm::command::{VgmCommand, encode_wait};

/// Fidelity switches for one encoding pass.
#[derive(Debug, Clone, Copy)]
pub struct EncoderOptions {
    /// Gate PSG/YM2413 writes behind the last-written diff. When false
    /// the encoder copies chip writes verbatim (the legacy low-fidelity
    /// trim mode).
    pub diff: bool,
    /// Force-silence PSG tone channels below the audibility cutoff.
    /// Only meaningful together with `diff`.
    pub remove_psg_offset: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            diff: true,
            remove_psg_offset: false,
        }
    }
}

/// Output writer state for a single pass.
pub struct EncoderContext {
    out: Vec<u8>,
    pending_pause: u64,
    written_psg: psg::PsgState,
    written_ym2413: ym2413::Ym2413State,
    noise_dirty: bool,
    silenced: [bool; 3],
    key_departed: [bool; ym2413::CHANNELS],
    rhythm_departed: u8,
    loop_offset: Option<usize>,
    opts: EncoderOptions,
}

impl EncoderContext {
    pub fn new(opts: EncoderOptions) -> Self {
        EncoderContext {
            out: Vec::new(),
            pending_pause: 0,
            written_psg: psg::PsgState::new(),
            written_ym2413: ym2413::Ym2413State::new(),
            noise_dirty: false,
            silenced: [false; 3],
            key_departed: [false; ym2413::CHANNELS],
            rhythm_departed: 0,
            loop_offset: None,
            opts,
        }
    }

    /// Bytes emitted so far.
    pub fn position(&self) -> usize {
        self.out.len()
    }

    /// Close the current merge window and accumulate a wait.
    pub fn wait(&mut self, state: &SystemState, samples: u64) {
        self.flush_writes(state);
        self.pending_pause += samples;
    }

    /// Accumulate a pause without closing the merge window. Used by the
    /// trim engine for the synthesized partial pauses at its boundaries.
    pub fn add_pause(&mut self, samples: u64) {
        self.pending_pause += samples;
    }

    /// Shorten the accumulated pause, clamping at zero.
    pub fn shorten_pause(&mut self, by: u64) {
        self.pending_pause = self.pending_pause.saturating_sub(by);
    }

    /// Flush all of the accumulated pause except `carry`, which keeps
    /// accumulating. The flush point becomes a command boundary suitable
    /// for a loop offset.
    pub fn split_pause(&mut self, carry: u64) {
        let head = self.pending_pause.saturating_sub(carry);
        self.pending_pause = head;
        self.flush_pause();
        self.pending_pause = carry;
    }

    /// Record the current output position as the loop offset.
    pub fn mark_loop_here(&mut self) {
        self.loop_offset = Some(self.out.len());
    }

    /// Close the merge window, flush the pause and record the loop
    /// offset, in that order. Used when the source loop point streams by.
    pub fn mark_loop(&mut self, state: &SystemState) {
        self.flush_writes(state);
        self.flush_pause();
        self.mark_loop_here();
    }

    /// Record an incoming PSG / GG-stereo / YM2413 write.
    ///
    /// In diff mode the write only updates the window bookkeeping; its
    /// value reaches the output through `state` when the window is
    /// flushed. `state` must not yet have the command applied, because
    /// resolving a PSG data byte needs the pre-write latch index. In
    /// pass-through mode the command is copied verbatim instead.
    pub fn chip_write(&mut self, state: &SystemState, command: &VgmCommand) {
        if !self.opts.diff {
            self.copy(state, command);
            return;
        }
        match command {
            VgmCommand::Sn76489Write(value) => {
                let register = if value & 0x80 != 0 {
                    (value >> 4) & 0x07
                } else {
                    state.psg.latched_register()
                };
                if register == 6 {
                    self.noise_dirty = true;
                }
            }
            VgmCommand::Ym2413Write { register, value } => {
                if let Some(ch) = ym2413::key_channel(*register) {
                    let written = self.written_ym2413.read(*register);
                    if (value ^ written) & ym2413::KEY_BIT != 0 {
                        self.key_departed[ch] = true;
                    }
                } else if *register == ym2413::RHYTHM_REGISTER {
                    let written = self.written_ym2413.read(*register);
                    self.rhythm_departed |= (value ^ written) & ym2413::RHYTHM_MASK;
                }
            }
            VgmCommand::GameGearStereo(_) => {}
            _ => {}
        }
    }

    /// Copy a command verbatim, after flushing the merge window and the
    /// accumulated pause so stream order is preserved.
    pub fn copy(&mut self, state: &SystemState, command: &VgmCommand) {
        self.flush_writes(state);
        self.flush_pause();
        command.encode_into(&mut self.out);
    }

    /// Emit a full state snapshot for every chip the file uses.
    ///
    /// PSG: tone pairs, noise, attenuations, stereo mask. YM2413: every
    /// implemented register in ascending order, so F-number lows land
    /// before the key/block highs. `with_keys == false` masks the key and
    /// percussion bits, for loop points that resume mid-note. The
    /// snapshot becomes the new last-written shadow.
    pub fn snapshot(&mut self, state: &SystemState, with_keys: bool) {
        if state.uses_psg {
            for ch in 0..3 {
                let bytes = psg::tone_bytes(ch, state.psg.tone(ch));
                self.emit_psg(&bytes);
            }
            self.emit_psg(&[psg::noise_byte(state.psg.noise())]);
            for ch in 0..psg::PSG_CHANNELS {
                self.emit_psg(&[psg::volume_byte(ch, state.psg.volume(ch))]);
            }
            self.out.extend_from_slice(&[0x4F, state.psg.stereo()]);
            self.written_psg.set_stereo(state.psg.stereo());
        }
        if state.uses_ym2413 {
            for register in ym2413::valid_registers() {
                let mut value = state.ym2413.read(register);
                if !with_keys {
                    value = ym2413::mask_key_bits(register, value);
                }
                self.emit_ym2413(register, value);
            }
        }
        self.noise_dirty = false;
        self.silenced = [false; 3];
        self.key_departed = [false; ym2413::CHANNELS];
        self.rhythm_departed = 0;
    }

    /// Flush everything still pending and terminate the stream.
    ///
    /// Returns the finished data region and the recorded loop offset
    /// within it, if any.
    pub fn finish(mut self, state: &SystemState) -> (Vec<u8>, Option<usize>) {
        self.flush_writes(state);
        self.flush_pause();
        VgmCommand::EndOfData.encode_into(&mut self.out);
        (self.out, self.loop_offset)
    }

    fn emit_psg(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.out.extend_from_slice(&[0x50, b]);
            self.written_psg.write(b);
        }
    }

    fn emit_ym2413(&mut self, register: u8, value: u8) {
        self.out.extend_from_slice(&[0x51, register, value]);
        self.written_ym2413.write(register, value);
    }

    fn flush_pause(&mut self) {
        encode_wait(&mut self.out, self.pending_pause);
        self.pending_pause = 0;
    }

    /// Close the merge window: compute the net register diff and write it
    /// out, preceded by the accumulated pause when anything is emitted.
    fn flush_writes(&mut self, state: &SystemState) {
        if !self.opts.diff {
            return;
        }
        let mut writes: Vec<u8> = Vec::new();
        if state.uses_psg {
            self.flush_psg(state, &mut writes);
        }
        if state.uses_ym2413 {
            self.flush_ym2413(state, &mut writes);
        }
        self.key_departed = [false; ym2413::CHANNELS];
        self.rhythm_departed = 0;
        if !writes.is_empty() {
            self.flush_pause();
            self.out.extend_from_slice(&writes);
        }
    }

    fn flush_psg(&mut self, state: &SystemState, writes: &mut Vec<u8>) {
        let mut push = |shadow: &mut psg::PsgState, bytes: &[u8]| {
            for &b in bytes {
                writes.extend_from_slice(&[0x50, b]);
                shadow.write(b);
            }
        };
        for ch in 0..3 {
            let period = state.psg.tone(ch);
            let silent = self.opts.remove_psg_offset
                && period < psg::SILENCE_CUTOFF
                && !(ch == 2 && state.psg.noise_uses_channel2());
            if silent {
                // One forced write per episode, minus whatever the shadow
                // already holds (an untouched channel emits nothing).
                if !self.silenced[ch] {
                    self.silenced[ch] = true;
                    if self.written_psg.volume(ch) != psg::MAX_ATTENUATION {
                        push(
                            &mut self.written_psg,
                            &[psg::volume_byte(ch, psg::MAX_ATTENUATION)],
                        );
                    }
                    if self.written_psg.tone(ch) != 0 {
                        push(&mut self.written_psg, &psg::tone_bytes(ch, 0));
                    }
                }
                continue;
            }
            self.silenced[ch] = false;
            if period != self.written_psg.tone(ch) {
                push(&mut self.written_psg, &psg::tone_bytes(ch, period));
            }
            let volume = state.psg.volume(ch);
            if volume != self.written_psg.volume(ch) {
                push(&mut self.written_psg, &[psg::volume_byte(ch, volume)]);
            }
        }
        if self.noise_dirty || state.psg.noise() != self.written_psg.noise() {
            push(&mut self.written_psg, &[psg::noise_byte(state.psg.noise())]);
        }
        self.noise_dirty = false;
        let noise_volume = state.psg.volume(psg::NOISE_CHANNEL);
        if noise_volume != self.written_psg.volume(psg::NOISE_CHANNEL) {
            push(
                &mut self.written_psg,
                &[psg::volume_byte(psg::NOISE_CHANNEL, noise_volume)],
            );
        }
        if state.psg.stereo() != self.written_psg.stereo() {
            writes.extend_from_slice(&[0x4F, state.psg.stereo()]);
            self.written_psg.set_stereo(state.psg.stereo());
        }
    }

    fn flush_ym2413(&mut self, state: &SystemState, writes: &mut Vec<u8>) {
        for register in ym2413::valid_registers() {
            let current = state.ym2413.read(register);
            let written = self.written_ym2413.read(register);
            let dud_mask = match ym2413::key_channel(register) {
                Some(ch) if self.key_departed[ch] => ym2413::KEY_BIT & current & written,
                _ if register == ym2413::RHYTHM_REGISTER => {
                    self.rhythm_departed & current & written & ym2413::RHYTHM_MASK
                }
                _ => 0,
            };
            if dud_mask != 0 {
                writes.extend_from_slice(&[0x51, register, current & !dud_mask]);
                writes.extend_from_slice(&[0x51, register, current]);
                self.written_ym2413.write(register, current);
            } else if current != written {
                writes.extend_from_slice(&[0x51, register, current]);
                self.written_ym2413.write(register, current);
            }
        }
    }
}
