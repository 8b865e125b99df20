//! Value-line parsing for the QSmart protocol.
//!
//! A value reply's primary line is `NAME = value`. Some registers answer
//! without the `=` (`STATE 2`), so the separator is optional.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::protocol::command::Register;
use crate::protocol::frame::is_error;

/// Extracts the payload of a value line for `register`.
///
/// # Errors
///
/// Returns `Error::Protocol` if the line reports an error or does not start
/// with the register name.
pub fn extract_value<'a>(register: &Register, line: &'a str) -> Result<&'a str> {
    if is_error(line) {
        return Err(Error::protocol(format!("{register}: {}", line.trim())));
    }

    let line = line.trim();
    let rest = line.strip_prefix(register.name).ok_or_else(|| {
        Error::protocol(format!("expected {register} value line, got {line:?}"))
    })?;

    // Reject a longer register name sharing the prefix, e.g. LVERS vs LVERSX.
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
    {
        return Err(Error::protocol(format!(
            "expected {register} value line, got {line:?}"
        )));
    }

    let rest = rest.trim_start();
    let value = rest.strip_prefix('=').unwrap_or(rest).trim();
    Ok(value)
}

/// Parses the value of `register` from its value line.
///
/// # Errors
///
/// Returns `Error::Protocol` for error or mis-shaped lines, and
/// `Error::Parse` if the payload is not a valid `V`.
pub fn parse_register<V: FromStr>(register: &Register, line: &str) -> Result<V> {
    let value = extract_value(register, line)?;
    value.parse().map_err(|_| Error::Parse {
        register: register.name.to_string(),
        value: value.to_string(),
    })
}
