//! Shared fixture builders: hand-assembled VGM byte images.
#![allow(dead_code)]

use vgmedit::vgm::header::VgmHeader;

/// Assemble a complete file image from a header template, raw command
/// bytes and an optional GD3 tag. Offsets and the end-of-file field are
/// filled in; everything else comes from the template.
pub fn build_file(
    mut header: VgmHeader,
    data: &[u8],
    loop_data_offset: Option<usize>,
    gd3: Option<&[u8]>,
) -> Vec<u8> {
    let data_start = header.data_start();
    header.set_loop_start(loop_data_offset.map(|off| data_start + off));
    header.set_gd3_start(gd3.map(|_| data_start + data.len()));
    header.set_file_length(data_start + data.len() + gd3.map_or(0, |g| g.len()));
    let mut out = header.to_bytes();
    out.extend_from_slice(data);
    if let Some(g) = gd3 {
        out.extend_from_slice(g);
    }
    out
}

/// Version 1.50 header template for a PSG-only recording.
pub fn psg_header(total_samples: u32, loop_samples: u32) -> VgmHeader {
    VgmHeader {
        version: 0x0000_0150,
        sn76489_clock: 3_579_545,
        sn_feedback: 0x0009,
        sn_shift_width: 16,
        total_samples,
        loop_samples,
        ..VgmHeader::default()
    }
}

/// A minimal valid GD3 tag: eleven empty strings.
pub fn empty_gd3() -> Vec<u8> {
    let mut tag = Vec::new();
    tag.extend_from_slice(b"Gd3 ");
    tag.extend_from_slice(&0x0000_0100_u32.to_le_bytes());
    tag.extend_from_slice(&22_u32.to_le_bytes());
    for _ in 0..11 {
        tag.extend_from_slice(&0_u16.to_le_bytes());
    }
    tag
}

/// Word-wait opcode bytes for an arbitrary sample count.
pub fn wait(samples: u16) -> [u8; 3] {
    let b = samples.to_le_bytes();
    [0x61, b[0], b[1]]
}
