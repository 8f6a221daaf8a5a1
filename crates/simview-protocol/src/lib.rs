//! simview Protocol - Line protocol spoken with the simulation server
//!
//! The server streams `;`-delimited ASCII records, one per line, grouped
//! into frames closed by an `END` line. The client answers with plain
//! text commands (`SCENARIO:<id>`, `SPEED:<n>`, `STOP`).
//!
//! This crate only converts between lines and typed values; it holds no
//! state and performs no I/O.

pub mod command;
pub mod decode;
pub mod record;

pub use command::{Command, CommandParseError};
pub use decode::{decode, DecodeError, FieldCount};
pub use record::Record;

/// Separator between the fields of a server record.
pub const FIELD_DELIMITER: char = ';';

/// Line closing a frame.
pub const FRAME_END: &str = "END";
