//! Optimization engine: one forward pass that coalesces pauses, elides
//! redundant PSG/YM2413 writes and silences inaudible PSG tone channels.
//!
//! The stream is re-encoded through [`EncoderContext`] with diffing and
//! offset removal enabled. Commands for uninterpreted chips, data blocks
//! and PCM RAM writes are copied verbatim, each preceded by a flush of
//! the accumulated pause. The loop point, when present, is re-recorded at
//! its flush point, so it stays on a command boundary. Sample totals are
//! preserved exactly; only the byte layout changes, which makes the pass
//! idempotent.
use crate::binutil::ParseError;
use crate::chip::SystemState;
use crate::encoder::{EncoderContext, EncoderOptions};
use crate::meta;
use crate::vgm::command::VgmCommand;
use crate::vgm::header::VgmHeader;
use crate::vgm::parser::CommandReader;

/// Optimize `bytes` (a complete VGM file image) and return the rewritten
/// file. Running the result through this function again yields identical
/// bytes.
pub fn optimize(bytes: &[u8]) -> Result<Vec<u8>, ParseError> {
    let header = VgmHeader::parse(bytes)?;

    let mut scanned = SystemState::new();
    for item in CommandReader::new(bytes, &header) {
        scanned.apply(&item?);
    }

    let mut state = SystemState::new();
    state.adopt_usage(&scanned);
    let mut enc = EncoderContext::new(EncoderOptions {
        diff: true,
        remove_psg_offset: true,
    });

    for item in CommandReader::new(bytes, &header) {
        let command = item?;
        if command.is_wait() {
            state.apply(&command);
            enc.wait(&state, u64::from(command.wait_samples()));
            continue;
        }
        match &command {
            VgmCommand::EndOfData => break,
            VgmCommand::LoopPoint => enc.mark_loop(&state),
            VgmCommand::Sn76489Write(_)
            | VgmCommand::GameGearStereo(_)
            | VgmCommand::Ym2413Write { .. } => {
                enc.chip_write(&state, &command);
                state.apply(&command);
            }
            _ => {
                enc.copy(&state, &command);
                state.apply(&command);
            }
        }
    }

    let (data, loop_offset) = enc.finish(&state);

    let mut out_header = header.clone();
    let data_start = out_header.data_start();
    out_header.set_loop_start(loop_offset.map(|off| data_start + off));
    if loop_offset.is_none() {
        out_header.loop_samples = 0;
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
