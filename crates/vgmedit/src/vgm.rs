//! VGM format model: header, typed commands and the stream decoder.
pub mod command;
pub mod header;
pub mod parser;

pub use command::VgmCommand;
pub use header::VgmHeader;
pub use parser::CommandReader;
