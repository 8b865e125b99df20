//! Line framing for the QSmart protocol.
//!
//! The laser never announces how long a reply is. Framing is inferred from
//! the content of the first line:
//! ```text
//! single line:  "OK"                 | "ERROR 12"
//! two lines:    "CGTEMP = 21.50"     + status line
//! ```
//! A first line containing `OK` or `ERROR` anywhere is terminal. Any other
//! first line is a value line and the device follows it with a status line.
//!
//! A value whose text itself contains `OK` or `ERROR` is framed as a single
//! line, and the unread status line then shifts every later reply on the
//! connection by one. The instrument's real framing contract is not
//! documented, so the rule is kept exactly as the device firmware appears
//! to behave rather than patched here.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// Line terminator appended to every outgoing command.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Maximum accepted length of one incoming line, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Substrings that make a first line terminal.
pub const TERMINAL_MARKERS: [&str; 2] = ["ERROR", "OK"];

/// Returns true if `line` is a complete reply on its own.
#[must_use]
pub fn is_terminal(line: &str) -> bool {
    TERMINAL_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Returns true if `line` reports a device-side error.
#[must_use]
pub fn is_error(line: &str) -> bool {
    line.contains("ERROR")
}

/// Encodes a command into one wire line with exactly one trailing line feed.
#[must_use]
pub fn encode_line(command: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(command.len() + 1);
    buf.put_slice(command);
    buf.put_u8(LINE_TERMINATOR);
    buf.freeze()
}

/// Decodes one raw incoming line: strips the terminator (and a preceding
/// carriage return) and checks the line is ASCII.
pub fn decode_line(raw: &[u8]) -> Result<String, FrameError> {
    let mut line = raw;
    if let Some(stripped) = line.strip_suffix(&[LINE_TERMINATOR]) {
        line = stripped;
    }
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }

    if line.len() > MAX_LINE_LENGTH {
        return Err(FrameError::TooLong {
            size: line.len(),
            max: MAX_LINE_LENGTH,
        });
    }
    if !line.is_ascii() {
        return Err(FrameError::NotAscii);
    }

    Ok(String::from_utf8_lossy(line).into_owned())
}

/// One logical reply from the laser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// First line: an acknowledgement, an error or a `NAME = value` line.
    pub primary: String,
    /// Status line following a value line; `None` for terminal replies.
    pub status: Option<String>,
}

impl Reply {
    /// Returns true if the primary line reports an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        is_error(&self.primary)
    }

    /// Number of wire lines this reply consumed.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        if self.status.is_some() { 2 } else { 1 }
    }

    /// Renders the reply as text, with or without the status line.
    #[must_use]
    pub fn into_text(self, include_status: bool) -> String {
        match self.status {
            Some(status) if include_status => format!("{}\n{status}", self.primary),
            _ => self.primary,
        }
    }
}

/// Assembles incoming lines into replies.
///
/// Feed it lines one at a time; it yields a [`Reply`] as soon as the lines
/// seen so far form a complete one.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    primary: Option<String>,
}

impl ReplyDecoder {
    /// Creates a new reply decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self { primary: None }
    }

    /// Feeds one decoded line.
    ///
    /// Returns `Some(reply)` once the reply is complete, `None` if another
    /// line is needed.
    pub fn push(&mut self, line: String) -> Option<Reply> {
        match self.primary.take() {
            Some(primary) => Some(Reply {
                primary,
                status: Some(line),
            }),
            None if is_terminal(&line) => Some(Reply {
                primary: line,
                status: None,
            }),
            None => {
                self.primary = Some(line);
                None
            }
        }
    }

    /// Returns true if a value line is waiting for its status line.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.primary.is_some()
    }

    /// Discards a partially assembled reply.
    pub fn clear(&mut self) {
        self.primary = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(lines: &[&str]) -> (Reply, usize) {
        let mut decoder = ReplyDecoder::new();
        for (consumed, line) in lines.iter().enumerate() {
            if let Some(reply) = decoder.push((*line).to_string()) {
                return (reply, consumed + 1);
            }
        }
        panic!("reply never completed");
    }

    #[test]
    fn test_terminal_lines_consume_one_line() {
        for first in ["OK", "ERROR", "ERROR 12: unknown command", "RUN OK", "xxERRORxx"] {
            let (reply, consumed) = frame(&[first, "should not be read"]);
            assert_eq!(consumed, 1, "{first}");
            assert_eq!(reply.primary, first);
            assert_eq!(reply.status, None);
        }
    }

    #[test]
    fn test_value_lines_consume_two_lines() {
        for first in ["CGTEMP = 21.50", "STATE 2", "TRIG = IE", ""] {
            let (reply, consumed) = frame(&[first, "0", "never"]);
            assert_eq!(consumed, 2, "{first:?}");
            assert_eq!(reply.primary, first);
            assert_eq!(reply.status.as_deref(), Some("0"));
        }
    }

    #[test]
    fn test_second_line_is_taken_verbatim() {
        // The status line is not inspected, even if it looks like a value.
        let (reply, consumed) = frame(&["QSPAR1 = 3", "QSPAR2 = 4"]);
        assert_eq!(consumed, 2);
        assert_eq!(reply.status.as_deref(), Some("QSPAR2 = 4"));
    }

    #[test]
    fn test_value_containing_marker_is_single_line() {
        // Known collision: payload text containing "OK" ends the frame early.
        let (reply, consumed) = frame(&["STATUS = LAMP OK", "0"]);
        assert_eq!(consumed, 1);
        assert_eq!(reply.line_count(), 1);
    }

    #[test]
    fn test_decoder_pending_and_clear() {
        let mut decoder = ReplyDecoder::new();
        assert!(decoder.push("LVERS = 1.2".into()).is_none());
        assert!(decoder.is_pending());
        decoder.clear();
        assert!(!decoder.is_pending());
        assert_eq!(
            decoder.push("OK".into()),
            Some(Reply {
                primary: "OK".into(),
                status: None
            })
        );
    }

    #[test]
    fn test_into_text() {
        let reply = Reply {
            primary: "CGTEMP = 21.5".into(),
            status: Some("0".into()),
        };
        assert_eq!(reply.clone().into_text(false), "CGTEMP = 21.5");
        assert_eq!(reply.into_text(true), "CGTEMP = 21.5\n0");

        let ok = Reply {
            primary: "OK".into(),
            status: None,
        };
        assert_eq!(ok.into_text(true), "OK");
    }

    #[test]
    fn test_encode_line() {
        assert_eq!(&encode_line(b"CGTEMP")[..], b"CGTEMP\n");
        assert_eq!(&encode_line(b"CAPVSET = 1200")[..], b"CAPVSET = 1200\n");
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"OK\n").unwrap(), "OK");
        assert_eq!(decode_line(b"OK\r\n").unwrap(), "OK");
        assert_eq!(decode_line(b"STATE 2").unwrap(), "STATE 2");
        assert!(matches!(
            decode_line(&[b'O', 0xC3, b'\n']),
            Err(FrameError::NotAscii)
        ));
        let long = vec![b'A'; MAX_LINE_LENGTH + 1];
        assert!(matches!(
            decode_line(&long),
            Err(FrameError::TooLong { .. })
        ));
    }
}
