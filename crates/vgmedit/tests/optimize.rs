//! Optimization engine behavior over complete file images.
mod common;

use common::{build_file, psg_header, wait};
use vgmedit::vgm::parser::decode_commands;
use vgmedit::{SystemState, VgmCommand, VgmHeader, optimize};

fn decoded(file: &[u8]) -> Vec<VgmCommand> {
    let header = VgmHeader::parse(file).expect("header");
    decode_commands(file, &header).expect("decode")
}

fn total_waited(commands: &[VgmCommand]) -> u64 {
    commands.iter().map(|c| u64::from(c.wait_samples())).sum()
}

#[test]
fn coalesces_pauses_and_drops_redundant_writes() {
    let mut data = vec![0x50, 0x8A, 0x50, 0x06, 0x50, 0x92];
    data.extend_from_slice(&wait(100));
    data.extend_from_slice(&wait(100));
    data.extend_from_slice(&[0x50, 0x92]);
    data.extend_from_slice(&wait(35));
    data.push(0x66);
    let file = build_file(psg_header(235, 0), &data, None, None);

    let optimized = optimize(&file).expect("optimize");
    let expected = build_file(
        psg_header(235, 0),
        &[0x50, 0x8A, 0x50, 0x06, 0x50, 0x92, 0x61, 235, 0, 0x66],
        None,
        None,
    );
    assert_eq!(optimized, expected);
}

#[test]
fn optimize_is_idempotent() {
    let mut data = vec![0x50, 0x8A, 0x50, 0x06, 0x50, 0x92];
    data.push(0x62);
    let loop_offset = data.len();
    // A key retrigger within one frame, some redundant writes, short
    // fragmented pauses.
    data.extend_from_slice(&[0x51, 0x10, 0x80, 0x51, 0x20, 0x15]);
    data.push(0x62);
    data.extend_from_slice(&[0x51, 0x20, 0x05, 0x51, 0x20, 0x15, 0x50, 0x92]);
    data.extend_from_slice(&wait(400));
    data.extend_from_slice(&wait(335));
    data.push(0x66);
    let file = build_file(psg_header(2205, 1470), &data, Some(loop_offset), None);

    let once = optimize(&file).expect("first pass");
    let twice = optimize(&once).expect("second pass");
    assert_eq!(once, twice);
}

#[test]
fn preserves_sample_totals_and_loop() {
    let mut data = vec![0x50, 0x8A, 0x50, 0x06, 0x50, 0x92];
    data.push(0x62);
    let loop_offset = data.len();
    data.extend_from_slice(&[0x50, 0x93]);
    data.push(0x62);
    data.push(0x62);
    data.push(0x66);
    let file = build_file(psg_header(2205, 1470), &data, Some(loop_offset), None);

    let optimized = optimize(&file).expect("optimize");
    let header = VgmHeader::parse(&optimized).expect("header");
    assert_eq!(header.total_samples, 2205);
    assert_eq!(header.loop_samples, 1470);
    assert!(header.loop_start().is_some());

    let commands = decoded(&optimized);
    assert_eq!(total_waited(&commands), 2205);
    let after_loop = commands
        .iter()
        .skip_while(|c| **c != VgmCommand::LoopPoint)
        .skip(1)
        .map(|c| u64::from(c.wait_samples()))
        .sum::<u64>();
    assert_eq!(after_loop, 1470);
}

#[test]
fn silences_inaudible_tone_channels() {
    // Channel 0 plays an audible frame, then its period drops to 3.
    let mut data = vec![0x50, 0x8A, 0x50, 0x06, 0x50, 0x92];
    data.push(0x62);
    data.extend_from_slice(&[0x50, 0x83, 0x50, 0x00]);
    data.push(0x62);
    data.push(0x66);
    let file = build_file(psg_header(1470, 0), &data, None, None);

    let commands = decoded(&optimize(&file).expect("optimize"));
    // Forced max attenuation and a zeroed period replace the inaudible
    // tone write.
    assert!(commands.contains(&VgmCommand::Sn76489Write(0x9F)));
    assert!(commands.contains(&VgmCommand::Sn76489Write(0x80)));
    assert!(!commands.contains(&VgmCommand::Sn76489Write(0x83)));
}

#[test]
fn keeps_channel2_when_noise_tracks_it() {
    // Noise mode 3 takes its pitch from channel 2, so the low period must
    // survive.
    let mut data = vec![0x50, 0xE7, 0x50, 0xC3, 0x50, 0x00, 0x50, 0xD2];
    data.push(0x62);
    data.push(0x66);
    let file = build_file(psg_header(735, 0), &data, None, None);

    let commands = decoded(&optimize(&file).expect("optimize"));
    assert!(commands.contains(&VgmCommand::Sn76489Write(0xC3)));
    assert!(commands.contains(&VgmCommand::Sn76489Write(0xD2)));
}

#[test]
fn copies_uninterpreted_commands_verbatim() {
    let mut data = vec![0x67, 0x66, 0x00, 2, 0, 0, 0, 0xAA, 0xBB];
    data.extend_from_slice(&[0x52, 0x28, 0xF0]);
    data.extend_from_slice(&[0x54, 0x08, 0x01]);
    data.push(0x62);
    data.push(0x66);
    let file = build_file(psg_header(735, 0), &data, None, None);

    let optimized = optimize(&file).expect("optimize");
    let commands = decoded(&optimized);
    assert!(matches!(commands[0], VgmCommand::DataBlock(_)));
    assert!(commands.contains(&VgmCommand::Ym2612Write {
        port: 0,
        register: 0x28,
        value: 0xF0,
    }));
    assert!(commands.contains(&VgmCommand::Ym2151Write {
        register: 0x08,
        value: 0x01,
    }));

    // Replaying both files ends in the same chip state.
    let play = |image: &[u8]| {
        let mut state = SystemState::new();
        for command in decoded(image) {
            state.apply(&command);
        }
        state
    };
    let before = play(&file);
    let after = play(&optimized);
    assert_eq!(before.ym2612, after.ym2612);
    assert_eq!(before.sample_count, after.sample_count);
}
