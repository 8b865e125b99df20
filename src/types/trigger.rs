//! Trigger source configuration.
//!
//! `TRIG` holds both trigger sources as two characters, flashlamp first and
//! Q-switch second, each `I` (internal) or `E` (external).

use std::fmt;

/// Source of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// Laser's own clock (`I`).
    Internal,
    /// External trigger input (`E`).
    External,
}

impl TriggerSource {
    /// Parses a trigger source from its wire character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::Internal),
            'E' => Some(Self::External),
            _ => None,
        }
    }

    /// Returns the wire character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Internal => 'I',
            Self::External => 'E',
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Internal => "Internal",
            Self::External => "External",
        })
    }
}

/// Both trigger sources as stored in `TRIG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerConfig {
    /// First character of `TRIG`.
    pub flashlamp: TriggerSource,
    /// Second character of `TRIG`.
    pub qswitch: TriggerSource,
}

impl TriggerConfig {
    /// Parses the two-character register value.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let flashlamp = TriggerSource::from_char(chars.next()?)?;
        let qswitch = TriggerSource::from_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Self { flashlamp, qswitch })
    }

    /// Encodes the two-character register value.
    #[must_use]
    pub fn code(&self) -> String {
        [self.flashlamp.as_char(), self.qswitch.as_char()]
            .iter()
            .collect()
    }
}

impl fmt::Display for TriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}
