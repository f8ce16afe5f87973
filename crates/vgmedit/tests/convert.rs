//! Trace format conversion: GYM, SSL and CYM inputs.
use vgmedit::convert::{FM_CLOCK, PSG_CLOCK};
use vgmedit::vgm::parser::decode_commands;
use vgmedit::{ConvertError, TraceFormat, VgmCommand, VgmHeader, convert};

fn data_region(file: &[u8]) -> (VgmHeader, Vec<u8>) {
    let header = VgmHeader::parse(file).expect("header");
    let data = file[header.data_start()..header.data_end()].to_vec();
    (header, data)
}

#[test]
fn maps_extensions_case_insensitively() {
    assert_eq!(TraceFormat::from_extension("gym"), Some(TraceFormat::Gym));
    assert_eq!(TraceFormat::from_extension("GYM"), Some(TraceFormat::Gym));
    assert_eq!(TraceFormat::from_extension("Ssl"), Some(TraceFormat::Ssl));
    assert_eq!(TraceFormat::from_extension("cym"), Some(TraceFormat::Cym));
    assert_eq!(TraceFormat::from_extension("vgm"), None);
}

#[test]
fn gym_spreads_dac_writes_across_the_frame() {
    let source = [
        0x01, 0x2A, 0x10, //
        0x01, 0x2A, 0x20, //
        0x01, 0x2A, 0x30, //
        0x00,
    ];
    let out = convert(TraceFormat::Gym, &source).expect("convert");
    let (header, data) = data_region(&out);
    assert_eq!(header.version, 0x0000_0110);
    assert_eq!(header.rate, 60);
    assert_eq!(header.ym2612_clock, FM_CLOCK);
    assert_eq!(header.sn76489_clock, 0);
    assert_eq!(header.total_samples, 735);
    assert_eq!(
        data,
        vec![
            0x52, 0x2A, 0x10, 0x61, 245, 0, //
            0x52, 0x2A, 0x20, 0x61, 245, 0, //
            0x52, 0x2A, 0x30, 0x61, 245, 0, //
            0x66,
        ]
    );
}

#[test]
fn gym_dac_pauses_cover_the_frame_exactly() {
    // 735 does not divide by 2; the shares are 367 and 368.
    let source = [0x01, 0x2A, 0x10, 0x01, 0x2A, 0x20, 0x00];
    let out = convert(TraceFormat::Gym, &source).expect("convert");
    let (header, _) = data_region(&out);
    let waited: u64 = decode_commands(&out, &header)
        .expect("decode")
        .iter()
        .map(|c| u64::from(c.wait_samples()))
        .sum();
    assert_eq!(waited, 735);
}

#[test]
fn gym_dac_run_cut_by_eof_emits_no_pauses() {
    let source = [0x01, 0x2A, 0x10, 0x01, 0x2A, 0x20];
    let out = convert(TraceFormat::Gym, &source).expect("convert");
    let (header, data) = data_region(&out);
    assert_eq!(header.total_samples, 0);
    assert_eq!(data, vec![0x52, 0x2A, 0x10, 0x52, 0x2A, 0x20, 0x66]);
}

#[test]
fn gym_non_dac_commands_pass_through() {
    let source = [
        0x02, 0xA4, 0x22, // port 1 write
        0x03, 0x9F, // PSG write
        0x00,
    ];
    let out = convert(TraceFormat::Gym, &source).expect("convert");
    let (header, data) = data_region(&out);
    assert_eq!(header.ym2612_clock, FM_CLOCK);
    assert_eq!(header.sn76489_clock, PSG_CLOCK);
    assert_eq!(header.sn_feedback, 0x0009);
    assert_eq!(header.sn_shift_width, 16);
    assert_eq!(data, vec![0x53, 0xA4, 0x22, 0x50, 0x9F, 0x62, 0x66]);
}

fn gymx_header(loop_marker: u32, packed: u32) -> Vec<u8> {
    let mut header = vec![0u8; 428];
    header[0..4].copy_from_slice(b"GYMX");
    header[420..424].copy_from_slice(&loop_marker.to_le_bytes());
    header[424..428].copy_from_slice(&packed.to_le_bytes());
    header
}

#[test]
fn gymx_loop_marker_becomes_the_loop_point() {
    let mut source = gymx_header(2, 0);
    source.extend_from_slice(&[0x03, 0x9F, 0x00]); // frame 0
    source.extend_from_slice(&[0x03, 0x90, 0x00]); // frame 1, loop target
    let out = convert(TraceFormat::Gym, &source).expect("convert");
    let header = VgmHeader::parse(&out).expect("header");
    assert_eq!(header.total_samples, 1470);
    assert_eq!(header.loop_samples, 735);
    assert_eq!(header.loop_start(), Some(header.data_start() + 3));
}

#[test]
fn gymx_compressed_data_is_rejected() {
    let mut source = gymx_header(0, 12345);
    source.push(0x00);
    let err = convert(TraceFormat::Gym, &source).unwrap_err();
    assert_eq!(err, ConvertError::UnsupportedCompressedGym);
}

#[test]
fn gym_rejects_unknown_opcode() {
    let source = [0x07];
    let err = convert(TraceFormat::Gym, &source).unwrap_err();
    assert!(matches!(err, ConvertError::Parse(_)));
}

#[test]
fn ssl_latches_the_ym2413_address() {
    let source = [0x05, 0x10, 0x06, 0x30, 0x00];
    let out = convert(TraceFormat::Ssl, &source).expect("convert");
    let (header, data) = data_region(&out);
    assert_eq!(header.ym2413_clock, PSG_CLOCK);
    assert_eq!(header.sn76489_clock, 0);
    assert_eq!(header.total_samples, 735);
    assert_eq!(data, vec![0x51, 0x10, 0x30, 0x62, 0x66]);
}

#[test]
fn ssl_psg_and_stereo_writes() {
    let source = [0x03, 0x9F, 0x04, 0xF0, 0x00];
    let out = convert(TraceFormat::Ssl, &source).expect("convert");
    let (header, data) = data_region(&out);
    assert_eq!(header.sn76489_clock, PSG_CLOCK);
    assert_eq!(data, vec![0x50, 0x9F, 0x4F, 0xF0, 0x62, 0x66]);

    let commands = decode_commands(&out, &header).expect("decode");
    assert_eq!(commands[0], VgmCommand::Sn76489Write(0x9F));
    assert_eq!(commands[1], VgmCommand::GameGearStereo(0xF0));
}

#[test]
fn cym_pairs_become_ym2151_writes() {
    let source = [0x20, 0x55, 0x00];
    let out = convert(TraceFormat::Cym, &source).expect("convert");
    let (header, data) = data_region(&out);
    assert_eq!(header.ym2151_clock, FM_CLOCK);
    assert_eq!(header.total_samples, 735);
    assert_eq!(data, vec![0x54, 0x20, 0x55, 0x62, 0x66]);
}
