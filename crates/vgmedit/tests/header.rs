//! Header model round-trips and validation.
mod common;

use common::{build_file, psg_header};
use vgmedit::ParseError;
use vgmedit::vgm::header::VgmHeader;

fn header_for_version(version: u32) -> VgmHeader {
    let mut h = VgmHeader {
        version,
        sn76489_clock: 3_579_545,
        ym2413_clock: 3_579_545,
        total_samples: 44_100,
        ..VgmHeader::default()
    };
    if version >= 0x101 {
        h.rate = 60;
    }
    if version >= 0x110 {
        h.sn_feedback = 0x0009;
        h.sn_shift_width = 16;
        h.ym2612_clock = 7_670_454;
        h.ym2151_clock = 3_579_580;
    }
    if version >= 0x151 {
        h.ay8910_clock = 1_789_750;
        h.ay8910_type = 0x10;
    }
    if version >= 0x160 {
        h.volume_modifier = 0x20;
        h.loop_base = 1;
    }
    h
}

#[test]
fn round_trip_every_supported_version() {
    for version in [0x100_u32, 0x101, 0x110, 0x150, 0x151, 0x160] {
        let file = build_file(header_for_version(version), &[0x66], None, None);
        let parsed = VgmHeader::parse(&file).unwrap_or_else(|e| {
            panic!("version 0x{:03X} failed to parse: {}", version, e)
        });
        assert_eq!(parsed.version, version);
        let reserialized = parsed.to_bytes();
        assert_eq!(
            reserialized,
            &file[..reserialized.len()],
            "version 0x{:03X} did not round-trip",
            version
        );
    }
}

#[test]
fn legacy_versions_share_the_ym2413_clock() {
    let file = build_file(header_for_version(0x101), &[0x66], None, None);
    let parsed = VgmHeader::parse(&file).unwrap();
    assert_eq!(parsed.ym2612_clock, parsed.ym2413_clock);
    assert_eq!(parsed.ym2151_clock, parsed.ym2413_clock);
    assert_eq!(parsed.sn_feedback, 0x0009);
    assert_eq!(parsed.sn_shift_width, 16);
}

#[test]
fn rejects_bad_ident() {
    let mut file = build_file(psg_header(0, 0), &[0x66], None, None);
    file[1] = b'G';
    assert!(matches!(
        VgmHeader::parse(&file),
        Err(ParseError::InvalidIdent(_))
    ));
}

#[test]
fn rejects_invalid_bcd_version() {
    let mut file = build_file(psg_header(0, 0), &[0x66], None, None);
    file[0x08] = 0x5A; // version 1.5A
    assert_eq!(
        VgmHeader::parse(&file),
        Err(ParseError::InvalidBcd(0x0000_015A))
    );
}

#[test]
fn rejects_unsupported_major_version() {
    let mut file = build_file(psg_header(0, 0), &[0x66], None, None);
    file[0x08..0x0C].copy_from_slice(&0x0000_0200_u32.to_le_bytes());
    assert_eq!(
        VgmHeader::parse(&file),
        Err(ParseError::UnsupportedVersion(0x200))
    );
}

#[test]
fn rejects_nonzero_reserved_padding() {
    // Version 1.10 defines fields up to 0x34; 0x34..0x40 must be zero.
    let mut file = build_file(header_for_version(0x110), &[0x66], None, None);
    file[0x3C] = 1;
    assert_eq!(
        VgmHeader::parse(&file),
        Err(ParseError::InvalidHeaderPadding { offset: 0x3C })
    );
}

#[test]
fn rejects_eof_mismatch() {
    let mut file = build_file(psg_header(0, 0), &[0x66], None, None);
    file.push(0);
    assert!(matches!(
        VgmHeader::parse(&file),
        Err(ParseError::EofMismatch { .. })
    ));
}

#[test]
fn rejects_data_offset_inside_fields() {
    let mut file = build_file(header_for_version(0x151), &[0x66], None, None);
    // Point the data offset at absolute 0x44, inside the 1.51 field region.
    file[0x34..0x38].copy_from_slice(&0x10_u32.to_le_bytes());
    assert!(matches!(
        VgmHeader::parse(&file),
        Err(ParseError::InvalidDataOffset { .. })
    ));
}

#[test]
fn offset_accessors() {
    let gd3 = common::empty_gd3();
    let file = build_file(psg_header(100, 0), &[0x62, 0x66], Some(0), Some(&gd3));
    let header = VgmHeader::parse(&file).unwrap();
    assert_eq!(header.data_start(), 0x40);
    assert_eq!(header.loop_start(), Some(0x40));
    assert_eq!(header.gd3_start(), Some(0x42));
    assert_eq!(header.data_end(), 0x42);
    assert_eq!(header.file_length(), file.len());
}
