use std::fs::File;
use std::io::{Read, Write, stdin};
use std::path::{Path, PathBuf};

use anyhow::Context;
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;
use unicode_width::UnicodeWidthStr;

use vgmedit::vgm::parser::decode_commands;
use vgmedit::{VgmCommand, VgmHeader};

/// Pad a &str to a target display width (columns) using unicode-width to
/// account for fullwidth characters (e.g. Japanese). This pads with spaces
/// on the right so strings appear left-aligned in terminal output.
fn pad_to_width(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Read VGM bytes from a path or stdin ('-') into a Vec<u8>.
///
/// Gzipped content (`.vgz`, or anything carrying the gzip magic bytes
/// 0x1F 0x8B) is decompressed transparently; the engines only ever see
/// raw VGM bytes.
pub fn read_vgm_as_vec(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    let inbuf = if path == Path::new("-") {
        let mut inbuf = Vec::new();
        stdin()
            .read_to_end(&mut inbuf)
            .context("failed to read from stdin")?;
        inbuf
    } else {
        let mut f = File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?;
        let mut inbuf = Vec::new();
        f.read_to_end(&mut inbuf)
            .context("failed to read input file")?;
        inbuf
    };

    if inbuf.len() >= 2 && inbuf[0] == 0x1F && inbuf[1] == 0x8B {
        let mut decoder = GzDecoder::new(&inbuf[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("failed to decompress gzip input")?;
        Ok(out)
    } else {
        Ok(inbuf)
    }
}

/// True when `path` asks for gzip output by its extension.
pub fn wants_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("vgz"))
        .unwrap_or(false)
}

/// Write a finished VGM byte stream to `path`, gzip-compressing it when
/// requested or when the path ends in `.vgz`.
///
/// The bytes go to a temp file in the destination directory first and only
/// replace `path` once fully written, so a failed run never leaves a
/// truncated file behind.
pub fn write_vgm(path: &Path, bytes: &[u8], gzip: bool) -> anyhow::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .context("failed to create temporary output file")?;

    if gzip || wants_gzip(path) {
        let mut encoder = GzEncoder::new(tmp.as_file_mut(), Compression::default());
        encoder
            .write_all(bytes)
            .context("failed to write gzip output")?;
        encoder.finish().context("failed to finish gzip output")?;
    } else {
        tmp.as_file_mut()
            .write_all(bytes)
            .context("failed to write output")?;
    }

    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// The eleven GD3 string fields, in tag order.
const GD3_FIELDS: [&str; 11] = [
    "track (en)",
    "track (ja)",
    "game (en)",
    "game (ja)",
    "system (en)",
    "system (ja)",
    "author (en)",
    "author (ja)",
    "release date",
    "converter",
    "notes",
];

/// Decode the UTF-16LE string block of a GD3 tag for display. Returns up
/// to eleven strings; a malformed block simply yields fewer.
fn gd3_strings(tag: &[u8]) -> Vec<String> {
    let mut strings = Vec::new();
    let block = &tag[12.min(tag.len())..];
    let mut units = block
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let mut current: Vec<u16> = Vec::new();
    for unit in &mut units {
        if unit == 0 {
            strings.push(String::from_utf16_lossy(&current));
            current.clear();
            if strings.len() == GD3_FIELDS.len() {
                break;
            }
        } else {
            current.push(unit);
        }
    }
    strings
}

fn clock_row(rows: &mut Vec<(String, String)>, name: &str, clock: u32) {
    if clock != 0 {
        rows.push((name.into(), format!("{} Hz", clock)));
    }
}

/// Print a two-column summary of one parsed file: header fields, command
/// stream statistics and the decoded GD3 tag.
pub fn info(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let header = VgmHeader::parse(bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let commands = decode_commands(bytes, &header)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let mut rows: Vec<(String, String)> = Vec::new();
    rows.push((
        "version".into(),
        // The version word is BCD, so hex digits print as decimal ones.
        format!(
            "{:X}.{:02X}",
            (header.version >> 8) & 0xFF,
            header.version & 0xFF
        ),
    ));
    clock_row(&mut rows, "sn76489 clock", header.sn76489_clock);
    clock_row(&mut rows, "ym2413 clock", header.ym2413_clock);
    clock_row(&mut rows, "ym2612 clock", header.ym2612_clock);
    clock_row(&mut rows, "ym2151 clock", header.ym2151_clock);
    if header.rate != 0 {
        rows.push(("rate".into(), format!("{} Hz", header.rate)));
    }

    const BASE_SR: f64 = 44100.0;
    rows.push((
        "total".into(),
        format!(
            "{} samples ({:.3} s)",
            header.total_samples,
            f64::from(header.total_samples) / BASE_SR
        ),
    ));
    if header.loop_samples != 0 {
        rows.push((
            "loop".into(),
            format!(
                "{} samples ({:.3} s)",
                header.loop_samples,
                f64::from(header.loop_samples) / BASE_SR
            ),
        ));
    }
    rows.push(("data offset".into(), format!("0x{:08X}", header.data_start())));
    if let Some(off) = header.loop_start() {
        rows.push(("loop offset".into(), format!("0x{:08X}", off)));
    }
    if let Some(off) = header.gd3_start() {
        rows.push(("gd3 offset".into(), format!("0x{:08X}", off)));
    }

    let waited: u64 = commands.iter().map(|c| u64::from(c.wait_samples())).sum();
    let (db_count, db_bytes) = commands.iter().fold((0usize, 0usize), |acc, c| match c {
        VgmCommand::DataBlock(db) => (acc.0 + 1, acc.1 + db.data.len()),
        _ => acc,
    });
    rows.push(("commands".into(), format!("{}", commands.len())));
    rows.push(("wait samples".into(), format!("{}", waited)));
    if db_count != 0 {
        rows.push((
            "data blocks".into(),
            format!("count={} total_bytes={}", db_count, db_bytes),
        ));
    }

    if let Some(gd3) = header.gd3_start() {
        let strings = gd3_strings(&bytes[gd3..]);
        // Align the values so the (en)/(ja) pairs read as one block even
        // with fullwidth text.
        let width = strings
            .iter()
            .map(|s| UnicodeWidthStr::width(s.as_str()))
            .max()
            .unwrap_or(0);
        for (name, value) in GD3_FIELDS.iter().zip(&strings) {
            if !value.is_empty() {
                rows.push(((*name).into(), pad_to_width(value, width)));
            }
        }
    }

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for (k, v) in rows {
        table.add_row(vec![Cell::new(k), Cell::new(v)]);
    }
    println!("{}", path.display());
    println!("{table}");
    Ok(())
}
