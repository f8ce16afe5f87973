//! vgmedit — trimmer, optimizer and trace-format converter for VGM
//! sound-chip logs.
//!
//! A VGM file is a binary log of timestamped register writes sent to retro
//! sound chips (SN76489 PSG, YM2413, YM2612, YM2151) during game emulation.
//! Because the byte stream encodes relative, stateful register deltas,
//! cutting or re-timing it requires reconstructing absolute chip state at
//! arbitrary points and re-synthesizing minimal-but-complete snapshots.
//! This crate provides exactly that machinery:
//!
//! - [`vgm::header::VgmHeader`] — strict parse/serialize of the versioned
//!   header (1.00 through 1.60 layouts).
//! - [`vgm::parser::CommandReader`] — the opcode-dispatching command
//!   stream decoder, with the virtual loop-point marker.
//! - [`chip::SystemState`] — PSG / YM2413 / YM2612 register tracking with
//!   latch and key-transition semantics.
//! - [`trim::trim`] — extract a `[start, loop, end)` sample window with
//!   correct state re-initialization at both cut points.
//! - [`optimize::optimize`] — coalesce pauses, elide redundant register
//!   writes, silence inaudible PSG tone channels.
//! - [`convert`] — re-encode the GYM, SSL and CYM trace formats into VGM,
//!   including the GYM DAC sample-spreading algorithm.
//!
//! The crate works on in-memory byte images and never touches the
//! filesystem; compression, file replacement and GD3 text display are the
//! caller's concern (see the `vgmedit-tools` crate).
//!
//! ```rust
//! use vgmedit::{NullSink, TrimOptions, TrimPoints, VgmHeader};
//!
//! # fn demo(bytes: &[u8]) -> Result<(), vgmedit::TrimError> {
//! let header = VgmHeader::parse(bytes)?;
//! let points = TrimPoints {
//!     start: 0,
//!     loop_point: Some(u64::from(header.total_samples) / 2),
//!     end: u64::from(header.total_samples),
//! };
//! let trimmed = vgmedit::trim(bytes, &points, &TrimOptions::default(), &mut NullSink)?;
//! assert_eq!(VgmHeader::parse(&trimmed)?.total_samples, header.total_samples);
//! # Ok(())
//! # }
//! ```

pub mod binutil;
pub mod chip;
pub mod convert;
pub mod encoder;
pub mod meta;
pub mod optimize;
pub mod report;
pub mod trim;
pub mod vgm;

pub use binutil::ParseError;
pub use chip::SystemState;
pub use convert::{ConvertError, TraceFormat, convert};
pub use encoder::{EncoderContext, EncoderOptions};
pub use optimize::optimize;
pub use report::{CollectSink, NullSink, StatusSink};
pub use trim::{EditPointError, TrimError, TrimOptions, TrimPoints, trim};
pub use vgm::command::VgmCommand;
pub use vgm::header::VgmHeader;
