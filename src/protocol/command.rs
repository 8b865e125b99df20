//! Commands and registers of the QSmart protocol.
//!
//! A command is one ASCII line without terminator: either a bare query
//! (`CGTEMP`) or a register name followed by a value. Depending on the
//! register the value is separated by a space (`QSW 1`) or by ` = `
//! (`CAPVSET = 1200`).

use std::fmt;

use bytes::Bytes;

use crate::error::FrameError;

/// How a register takes a value on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteStyle {
    /// Register is read-only.
    ReadOnly,
    /// `NAME value`.
    Spaced,
    /// `NAME = value`.
    Assigned,
}

/// A named instrument register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    /// Register name as sent on the wire.
    pub name: &'static str,
    /// Write encoding.
    pub write: WriteStyle,
    /// Writes require admin mode.
    pub admin: bool,
}

impl Register {
    const fn read_only(name: &'static str) -> Self {
        Self {
            name,
            write: WriteStyle::ReadOnly,
            admin: false,
        }
    }

    const fn spaced(name: &'static str, admin: bool) -> Self {
        Self {
            name,
            write: WriteStyle::Spaced,
            admin,
        }
    }

    const fn assigned(name: &'static str, admin: bool) -> Self {
        Self {
            name,
            write: WriteStyle::Assigned,
            admin,
        }
    }

    /// Returns true if the register accepts writes.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !matches!(self.write, WriteStyle::ReadOnly)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Register catalog.
pub mod registers {
    use super::Register;

    // System
    /// Operating state, 0-9.
    pub const STATE: Register = Register::read_only("STATE");
    /// Free-text composite status.
    pub const STATUS: Register = Register::read_only("STATUS");
    /// Cooling group temperature in degrees Celsius.
    pub const CGTEMP: Register = Register::read_only("CGTEMP");
    /// Power supply firmware version.
    pub const PSVERS: Register = Register::read_only("PSVERS");
    /// Laser brain firmware version.
    pub const LVERS: Register = Register::read_only("LVERS");
    /// User interface firmware version.
    pub const UIVERS: Register = Register::read_only("UIVERS");
    /// Serial number check toggle.
    pub const CHKSERIAL: Register = Register::spaced("CHKSERIAL", true);
    /// Command echo.
    pub const ECHO: Register = Register::spaced("ECHO", true);

    // Flashlamp
    /// Flashlamp capacitor voltage in volts.
    pub const CAPVSET: Register = Register::assigned("CAPVSET", true);
    /// Flashlamp pulse width in microseconds.
    pub const LPW: Register = Register::assigned("LPW", true);
    /// Total shot counter.
    pub const SSHOT: Register = Register::read_only("SSHOT");
    /// User shot counter; only reset to zero.
    pub const USHOT: Register = Register::spaced("USHOT", true);
    /// Trigger sources, two characters: flashlamp then Q-switch.
    pub const TRIG: Register = Register::spaced("TRIG", false);

    // Q-switch
    /// Mode register 1: burst cycle count, zero outside burst.
    pub const QSPAR1: Register = Register::spaced("QSPAR1", false);
    /// Mode register 2: total length or frequency divider.
    pub const QSPAR2: Register = Register::spaced("QSPAR2", false);
    /// Mode register 3: shots per cycle, 1 selects divider mode.
    pub const QSPAR3: Register = Register::spaced("QSPAR3", false);
    /// Q-switch delay in nanoseconds, 0-255.
    pub const QDLY: Register = Register::spaced("QDLY", true);
    /// Q-switch delay offset in nanoseconds.
    pub const QDLYO: Register = Register::spaced("QDLYO", false);
}

/// Action keywords that carry no register value.
pub mod actions {
    /// Start flashing.
    pub const RUN: &str = "RUN";
    /// Stop flashing.
    pub const STOP: &str = "STOP";
    /// Q-switch enable, followed by 0 or 1.
    pub const QSW: &str = "QSW";
    /// Hand control to the front panel, followed by 1.
    pub const SSWITCH: &str = "SSWITCH";
}

/// One outgoing command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(String);

impl Command {
    /// Builds a bare query for a register.
    #[must_use]
    pub fn query(register: &Register) -> Self {
        Self(register.name.to_string())
    }

    /// Builds a write for a register using its write style.
    ///
    /// Read-only registers fall back to the spaced form; callers check
    /// [`Register::is_writable`] first.
    #[must_use]
    pub fn write(register: &Register, value: impl fmt::Display) -> Self {
        match register.write {
            WriteStyle::Assigned => Self(format!("{} = {value}", register.name)),
            WriteStyle::Spaced | WriteStyle::ReadOnly => {
                Self(format!("{} {value}", register.name))
            }
        }
    }

    /// Builds a bare keyword command, e.g. `RUN`.
    #[must_use]
    pub fn keyword(keyword: &'static str) -> Self {
        Self(keyword.to_string())
    }

    /// Builds a keyword command with an argument, e.g. `QSW 1`.
    #[must_use]
    pub fn keyword_with(keyword: &'static str, argument: impl fmt::Display) -> Self {
        Self(format!("{keyword} {argument}"))
    }

    /// Builds a command from arbitrary text.
    ///
    /// # Errors
    ///
    /// Returns a `FrameError` if the text is empty, not ASCII, or contains
    /// a line terminator.
    pub fn raw(text: impl Into<String>) -> Result<Self, FrameError> {
        let text = text.into();
        if text.is_empty() {
            return Err(FrameError::Empty);
        }
        if !text.is_ascii() {
            return Err(FrameError::NotAscii);
        }
        if text.contains(['\n', '\r']) {
            return Err(FrameError::EmbeddedTerminator);
        }
        Ok(Self(text))
    }

    /// Returns the command text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the command as bytes, without terminator.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.0.as_bytes())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
