//! Command stream decoding over hand-assembled file images.
mod common;

use common::{build_file, empty_gd3, psg_header, wait};
use vgmedit::vgm::command::{DataBlock, PcmRamWrite};
use vgmedit::vgm::parser::{CommandReader, decode_commands};
use vgmedit::{ParseError, VgmCommand, VgmHeader};

fn parse(file: &[u8]) -> (VgmHeader, Vec<u8>) {
    let header = VgmHeader::parse(file).expect("header");
    (header, file.to_vec())
}

#[test]
fn decodes_every_opcode_shape() {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x4F, 0xF0]);
    data.extend_from_slice(&[0x50, 0x9F]);
    data.extend_from_slice(&[0x51, 0x20, 0x15]);
    data.extend_from_slice(&[0x52, 0x28, 0xF0]);
    data.extend_from_slice(&[0x53, 0xA4, 0x22]);
    data.extend_from_slice(&[0x54, 0x08, 0x01]);
    data.extend_from_slice(&[0x5A, 0x12, 0x34]);
    data.extend_from_slice(&wait(0x1234));
    data.push(0x62);
    data.push(0x63);
    data.extend_from_slice(&[0x67, 0x66, 0x00, 3, 0, 0, 0, 0xAA, 0xBB, 0xCC]);
    data.extend_from_slice(&[0x68, 0x66, 0x02, 1, 0, 0, 2, 0, 0, 3, 0, 0]);
    data.push(0x70);
    data.push(0x7F);
    data.push(0x66);

    let file = build_file(psg_header(44100, 0), &data, None, None);
    let (header, file) = parse(&file);
    let commands = decode_commands(&file, &header).expect("decode");
    assert_eq!(
        commands,
        vec![
            VgmCommand::GameGearStereo(0xF0),
            VgmCommand::Sn76489Write(0x9F),
            VgmCommand::Ym2413Write {
                register: 0x20,
                value: 0x15,
            },
            VgmCommand::Ym2612Write {
                port: 0,
                register: 0x28,
                value: 0xF0,
            },
            VgmCommand::Ym2612Write {
                port: 1,
                register: 0xA4,
                value: 0x22,
            },
            VgmCommand::Ym2151Write {
                register: 0x08,
                value: 0x01,
            },
            VgmCommand::ReservedWrite {
                opcode: 0x5A,
                address: 0x12,
                data: 0x34,
            },
            VgmCommand::WaitSamples(0x1234),
            VgmCommand::Wait735Samples,
            VgmCommand::Wait882Samples,
            VgmCommand::DataBlock(DataBlock {
                marker: 0x66,
                data_type: 0x00,
                data: vec![0xAA, 0xBB, 0xCC],
            }),
            VgmCommand::PcmRamWrite(PcmRamWrite {
                marker: 0x66,
                chip_type: 0x02,
                read_offset: 1,
                write_offset: 2,
                size: 3,
            }),
            VgmCommand::WaitNSamples(1),
            VgmCommand::WaitNSamples(16),
            VgmCommand::EndOfData,
        ]
    );
}

#[test]
fn loop_point_is_synthesized_in_stream_order() {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x50, 0x80]);
    data.extend_from_slice(&wait(100));
    data.push(0x66);
    let file = build_file(psg_header(100, 100), &data, Some(2), None);
    let (header, file) = parse(&file);
    let commands = decode_commands(&file, &header).expect("decode");
    assert_eq!(
        commands,
        vec![
            VgmCommand::Sn76489Write(0x80),
            VgmCommand::LoopPoint,
            VgmCommand::WaitSamples(100),
            VgmCommand::EndOfData,
        ]
    );
}

#[test]
fn loop_point_at_stream_start() {
    let mut data = wait(50).to_vec();
    data.push(0x66);
    let file = build_file(psg_header(50, 50), &data, Some(0), None);
    let (header, file) = parse(&file);
    let commands = decode_commands(&file, &header).expect("decode");
    assert_eq!(commands[0], VgmCommand::LoopPoint);
    assert_eq!(commands[1], VgmCommand::WaitSamples(50));
}

#[test]
fn loop_offset_off_command_boundary_is_dropped() {
    let mut data = wait(50).to_vec();
    data.push(0x66);
    // Offset 1 lands inside the wait payload; no command starts there.
    let file = build_file(psg_header(50, 50), &data, Some(1), None);
    let (header, file) = parse(&file);
    let commands = decode_commands(&file, &header).expect("decode");
    assert!(!commands.contains(&VgmCommand::LoopPoint));
    assert_eq!(commands.len(), 2);
}

#[test]
fn rejects_unknown_opcode() {
    let data = [0x64, 0x66];
    let file = build_file(psg_header(0, 0), &data, None, None);
    let (header, file) = parse(&file);
    let err = decode_commands(&file, &header).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnknownOpcode {
            opcode: 0x64,
            offset: header.data_start(),
        }
    );
}

#[test]
fn rejects_stream_without_end_marker() {
    let data = [0x62];
    let file = build_file(psg_header(735, 0), &data, None, None);
    let (header, file) = parse(&file);
    let err = decode_commands(&file, &header).unwrap_err();
    assert!(matches!(err, ParseError::PrematureEnd { .. }));
}

#[test]
fn rejects_bytes_after_end_marker() {
    let data = [0x66, 0x62];
    let file = build_file(psg_header(0, 0), &data, None, None);
    let (header, file) = parse(&file);
    let err = decode_commands(&file, &header).unwrap_err();
    assert_eq!(
        err,
        ParseError::TrailingBytes {
            offset: header.data_start() + 1,
            expected: header.data_start() + 2,
        }
    );
}

#[test]
fn rejects_payload_crossing_into_gd3() {
    // The wait payload would be read out of the GD3 tag bytes.
    let data = [0x61, 0x10];
    let file = build_file(psg_header(0, 0), &data, None, Some(&empty_gd3()));
    let (header, file) = parse(&file);
    let err = decode_commands(&file, &header).unwrap_err();
    assert!(matches!(err, ParseError::PrematureEnd { .. }));
}

#[test]
fn reader_reports_command_offsets() {
    let mut data = wait(10).to_vec();
    data.push(0x66);
    let file = build_file(psg_header(10, 0), &data, None, None);
    let (header, file) = parse(&file);
    let mut reader = CommandReader::new(&file, &header);
    assert_eq!(reader.offset(), header.data_start());
    reader.next().unwrap().unwrap();
    assert_eq!(reader.offset(), header.data_start() + 3);
}
