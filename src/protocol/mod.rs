//! Protocol definitions for QSmart communication.
//!
//! This module contains the wire-level pieces:
//! - Line encoding and reply framing
//! - Commands and the register catalog
//! - Value-line parsing

pub mod command;
pub mod frame;
pub mod parser;

pub use command::{Command, Register, WriteStyle, actions, registers};
pub use frame::{
    LINE_TERMINATOR, MAX_LINE_LENGTH, Reply, ReplyDecoder, decode_line, encode_line, is_error,
    is_terminal,
};
pub use parser::{extract_value, parse_register};
