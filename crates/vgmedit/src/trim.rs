//! Trim engine: extract a `[start, loop, end)` sample window.
//!
//! The source is scanned command by command while a [`SystemState`]
//! reconstructs absolute chip state. Three fire-once boundary events
//! shape the output:
//!
//! 1. Start crossed: emit a full state snapshot followed by the part of
//!    the in-flight pause that lies past the start point, then switch to
//!    diff-gated emission for PSG/YM2413 and verbatim copying for
//!    everything else.
//! 2. Loop crossed: split the in-flight pause at the loop point, record
//!    the output offset there and, unless the loop coincides with the
//!    start, emit a key-less snapshot — the loop resumes mid-note.
//! 3. End reached: truncate the carried pause so the cumulative length
//!    equals `end - start`, terminate the stream, and copy the trailing
//!    GD3 tag verbatim.
//!
//! Data blocks and PCM RAM writes seen before the start point are copied
//! ahead of the start snapshot: sample banks are time-independent
//! definitions and dropping them would mute DAC playback. Pre-start
//! register writes to uninterpreted chips are dropped with the rest.
use std::fmt;

use crate::binutil::ParseError;
use crate::chip::SystemState;
use crate::encoder::{EncoderContext, EncoderOptions};
use crate::meta;
use crate::report::StatusSink;
use crate::vgm::command::VgmCommand;
use crate::vgm::header::VgmHeader;
use crate::vgm::parser::CommandReader;

/// Invalid combinations of edit points, rejected before any output is
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPointError {
    /// `start > end`, `loop > end` or `loop < start`.
    InvalidEditPoints {
        start: u64,
        loop_point: Option<u64>,
        end: u64,
    },
    /// An edit point lies past the last sample of the file, so no window
    /// can be produced at all.
    PointBeyondFile { point: u64, total: u64 },
}

impl fmt::Display for EditPointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditPointError::InvalidEditPoints {
                start,
                loop_point,
                end,
            } => match loop_point {
                Some(lp) => write!(
                    f,
                    "invalid edit points: start {} loop {} end {}",
                    start, lp, end
                ),
                None => write!(f, "invalid edit points: start {} end {}", start, end),
            },
            EditPointError::PointBeyondFile { point, total } => {
                write!(
                    f,
                    "edit point {} is beyond the file's {} samples",
                    point, total
                )
            }
        }
    }
}

impl std::error::Error for EditPointError {}

/// Everything that can stop a trim pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimError {
    Parse(ParseError),
    Edit(EditPointError),
}

impl fmt::Display for TrimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimError::Parse(e) => write!(f, "{}", e),
            TrimError::Edit(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TrimError {}

impl From<ParseError> for TrimError {
    fn from(e: ParseError) -> Self {
        TrimError::Parse(e)
    }
}

impl From<EditPointError> for TrimError {
    fn from(e: EditPointError) -> Self {
        TrimError::Edit(e)
    }
}

/// The sample window to extract. `loop_point == None` produces a
/// non-looping file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPoints {
    pub start: u64,
    pub loop_point: Option<u64>,
    pub end: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrimOptions {
    /// Copy PSG/YM2413 writes verbatim instead of diff-gating them — the
    /// legacy low-fidelity mode.
    pub pass_through: bool,
}

/// Trim `bytes` (a complete VGM file image) to the given window and
/// return the rewritten file.
///
/// An end point past the file's total sample count is capped to it with
/// a warning on `sink` rather than rejected, as the convenience way to
/// say "to the end".
pub fn trim(
    bytes: &[u8],
    points: &TrimPoints,
    opts: &TrimOptions,
    sink: &mut dyn StatusSink,
) -> Result<Vec<u8>, TrimError> {
    let header = VgmHeader::parse(bytes)?;
    let total = u64::from(header.total_samples);

    let mut end = points.end;
    if end > total {
        sink.warning(&format!(
            "end point {} is past the last sample {}; capping to the file length",
            end, total
        ));
        end = total;
    }
    let start = points.start;
    let loop_point = points.loop_point;
    if start > total {
        return Err(EditPointError::PointBeyondFile {
            point: start,
            total,
        }
        .into());
    }
    if start > end
        || loop_point.is_some_and(|lp| lp > end || lp < start)
    {
        return Err(EditPointError::InvalidEditPoints {
            start,
            loop_point,
            end,
        }
        .into());
    }

    // Whole-file scan for the per-chip usage flags that gate snapshots.
    let mut scanned = SystemState::new();
    for item in CommandReader::new(bytes, &header) {
        scanned.apply(&item?);
    }

    let mut state = SystemState::new();
    state.adopt_usage(&scanned);
    let mut enc = EncoderContext::new(EncoderOptions {
        diff: !opts.pass_through,
        remove_psg_offset: false,
    });

    let mut started = false;
    let mut looped = false;

    for item in CommandReader::new(bytes, &header) {
        let command = item?;
        if command.is_wait() {
            let length = u64::from(command.wait_samples());
            state.apply(&command);
            let now = state.sample_count;
            if !started && now >= start {
                started = true;
                begin_output(&mut enc, &state, start, loop_point, &mut looped);
                enc.add_pause(now - start);
            } else if started {
                enc.wait(&state, length);
            }
            if started
                && !looped
                && let Some(lp) = loop_point
                && now >= lp
            {
                looped = true;
                enc.split_pause(now - lp);
                enc.mark_loop_here();
                enc.snapshot(&state, false);
            }
            if started && now >= end {
                enc.shorten_pause(now - end);
                break;
            }
        } else {
            if !started && state.sample_count >= start {
                started = true;
                begin_output(&mut enc, &state, start, loop_point, &mut looped);
            }
            if started && state.sample_count >= end {
                break;
            }
            match &command {
                VgmCommand::EndOfData => break,
                VgmCommand::LoopPoint => {
                    // The source loop is replaced by the new window.
                }
                VgmCommand::DataBlock(_) | VgmCommand::PcmRamWrite(_) => {
                    enc.copy(&state, &command);
                    state.apply(&command);
                }
                VgmCommand::Sn76489Write(_)
                | VgmCommand::GameGearStereo(_)
                | VgmCommand::Ym2413Write { .. } => {
                    if started {
                        enc.chip_write(&state, &command);
                    }
                    state.apply(&command);
                }
                _ => {
                    if started {
                        enc.copy(&state, &command);
                    }
                    state.apply(&command);
                }
            }
        }
    }

    if !started {
        // The stream ran out before the start point; emit what state we
        // have so the output is still well-formed.
        begin_output(&mut enc, &state, start, loop_point, &mut looped);
    }

    let (data, loop_offset) = enc.finish(&state);

    let mut out_header = header.clone();
    let data_start = out_header.data_start();
    out_header.total_samples = (end - start) as u32;
    match (loop_point, loop_offset) {
        (Some(lp), Some(off)) => {
            out_header.loop_samples = (end - lp) as u32;
            out_header.set_loop_start(Some(data_start + off));
        }
        _ => {
            out_header.loop_samples = 0;
            out_header.set_loop_start(None);
        }
    }

    let gd3 = match header.gd3_start() {
        Some(g) => meta::gd3_raw(&bytes[g..])?,
        None => &[],
    };
    out_header.set_gd3_start((!gd3.is_empty()).then(|| data_start + data.len()));
    out_header.set_file_length(data_start + data.len() + gd3.len());

    let mut out = out_header.to_bytes();
    out.extend_from_slice(&data);
    out.extend_from_slice(gd3);
    Ok(out)
}

/// Fire the start-crossed event: record the loop offset first when the
/// loop coincides with the start (so looping replays the snapshot), then
/// emit the full snapshot.
fn begin_output(
    enc: &mut EncoderContext,
    state: &SystemState,
    start: u64,
    loop_point: Option<u64>,
    looped: &mut bool,
) {
    if loop_point == Some(start) {
        *looped = true;
        enc.mark_loop_here();
    }
    enc.snapshot(state, true);
}
