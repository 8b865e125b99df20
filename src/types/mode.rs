//! Q-switch operating modes.
//!
//! The laser has no mode register. The mode is encoded across `QSPAR1`,
//! `QSPAR2` and `QSPAR3`:
//!
//! | mode    | QSPAR1 | QSPAR2       | QSPAR3          |
//! |---------|--------|--------------|-----------------|
//! | Burst   | cycles | total length | shots per cycle |
//! | Scan    | 0      | total length | shots per cycle |
//! | Divider | 0      | divider      | 1               |
//!
//! Decoding: `QSPAR1 != 0` is Burst, otherwise `QSPAR3 == 1` is Divider,
//! otherwise Scan.

use std::fmt;

use crate::error::{Error, Result};

/// Operating mode derived from the three mode registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Repeated bursts of Q-switched shots.
    Burst,
    /// Continuous scan.
    Scan,
    /// Fixed frequency division of the flashlamp rate (`FN`).
    Divider,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Burst => "Burst",
            Self::Scan => "Scan",
            Self::Divider => "FN",
        })
    }
}

/// Raw values of `QSPAR1..3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeRegisters {
    /// `QSPAR1`: burst cycle count, zero outside burst mode.
    pub qspar1: u32,
    /// `QSPAR2`: total sequence length, or the divider in FN mode.
    pub qspar2: u32,
    /// `QSPAR3`: shots per cycle, 1 in FN mode.
    pub qspar3: u32,
}

impl ModeRegisters {
    /// Decodes the mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        if self.qspar1 != 0 {
            Mode::Burst
        } else if self.qspar3 == 1 {
            Mode::Divider
        } else {
            Mode::Scan
        }
    }

    /// Decodes the mode together with its parameters.
    #[must_use]
    pub const fn settings(&self) -> ModeSettings {
        match self.mode() {
            Mode::Burst => ModeSettings::Burst {
                cycles: self.qspar1,
                shots_per_cycle: self.qspar3,
                total_length: self.qspar2,
            },
            Mode::Scan => ModeSettings::Scan {
                shots_per_cycle: self.qspar3,
                total_length: self.qspar2,
            },
            Mode::Divider => ModeSettings::Divider {
                divider: self.qspar2,
            },
        }
    }
}

/// A mode with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSettings {
    /// Repeated bursts of Q-switched shots.
    Burst {
        /// Number of burst cycles, at least 1.
        cycles: u32,
        /// Q-switched shots per cycle, at least 1.
        shots_per_cycle: u32,
        /// Total sequence length in flashlamp pulses.
        total_length: u32,
    },
    /// Continuous scan of Q-switched shots.
    Scan {
        /// Q-switched shots per cycle, at least 2.
        shots_per_cycle: u32,
        /// Total sequence length in flashlamp pulses.
        total_length: u32,
    },
    /// Q-switch fires on every n-th flashlamp pulse.
    Divider {
        /// Flashlamp pulses per Q-switched shot, at least 1.
        divider: u32,
    },
}

impl ModeSettings {
    /// Builds settings from loosely specified parameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a parameter required by `mode` is
    /// missing or the resulting settings are invalid.
    pub fn from_params(mode: Mode, params: &ModeParams) -> Result<Self> {
        fn require(value: Option<u32>, name: &str, mode: Mode) -> Result<u32> {
            value.ok_or_else(|| Error::validation(format!("{mode} mode requires {name}")))
        }

        let settings = match mode {
            Mode::Burst => Self::Burst {
                cycles: require(params.cycles, "cycles", mode)?,
                shots_per_cycle: require(params.shots_per_cycle, "shots per cycle", mode)?,
                total_length: require(params.total_length, "total length", mode)?,
            },
            Mode::Scan => Self::Scan {
                shots_per_cycle: require(params.shots_per_cycle, "shots per cycle", mode)?,
                total_length: require(params.total_length, "total length", mode)?,
            },
            Mode::Divider => Self::Divider {
                divider: require(params.divider, "divider", mode)?,
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Returns the mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Burst { .. } => Mode::Burst,
            Self::Scan { .. } => Mode::Scan,
            Self::Divider { .. } => Mode::Divider,
        }
    }

    /// Checks the settings can be written and decoded back to the same mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Burst {
                cycles,
                shots_per_cycle,
                total_length,
            } => {
                if cycles == 0 {
                    return Err(Error::validation("burst cycles must be at least 1"));
                }
                if shots_per_cycle == 0 {
                    return Err(Error::validation("shots per cycle must be at least 1"));
                }
                check_length(shots_per_cycle, total_length)
            }
            Self::Scan {
                shots_per_cycle,
                total_length,
            } => {
                // QSPAR3 == 1 with QSPAR1 == 0 reads back as divider mode.
                if shots_per_cycle < 2 {
                    return Err(Error::validation(
                        "scan shots per cycle must be at least 2",
                    ));
                }
                check_length(shots_per_cycle, total_length)
            }
            Self::Divider { divider } => {
                if divider == 0 {
                    return Err(Error::validation("divider must be at least 1"));
                }
                Ok(())
            }
        }
    }

    /// Encodes validated settings into the three mode registers.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the settings are invalid.
    pub fn to_registers(&self) -> Result<ModeRegisters> {
        self.validate()?;
        Ok(match *self {
            Self::Burst {
                cycles,
                shots_per_cycle,
                total_length,
            } => ModeRegisters {
                qspar1: cycles,
                qspar2: total_length,
                qspar3: shots_per_cycle,
            },
            Self::Scan {
                shots_per_cycle,
                total_length,
            } => ModeRegisters {
                qspar1: 0,
                qspar2: total_length,
                qspar3: shots_per_cycle,
            },
            Self::Divider { divider } => ModeRegisters {
                qspar1: 0,
                qspar2: divider,
                qspar3: 1,
            },
        })
    }
}

fn check_length(shots_per_cycle: u32, total_length: u32) -> Result<()> {
    if total_length < shots_per_cycle {
        return Err(Error::validation(format!(
            "total length {total_length} is shorter than shots per cycle {shots_per_cycle}"
        )));
    }
    Ok(())
}

/// Loosely specified mode parameters, checked by [`ModeSettings::from_params`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeParams {
    /// Burst cycle count, burst mode only.
    pub cycles: Option<u32>,
    /// Shots per cycle, burst and scan modes.
    pub shots_per_cycle: Option<u32>,
    /// Total sequence length, burst and scan modes.
    pub total_length: Option<u32>,
    /// Flashlamp pulses per shot, FN mode only.
    pub divider: Option<u32>,
}

impl ModeParams {
    /// Creates empty parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cycles: None,
            shots_per_cycle: None,
            total_length: None,
            divider: None,
        }
    }

    /// Sets the burst cycle count.
    #[must_use]
    pub const fn cycles(mut self, cycles: u32) -> Self {
        self.cycles = Some(cycles);
        self
    }

    /// Sets the shots per cycle.
    #[must_use]
    pub const fn shots_per_cycle(mut self, shots: u32) -> Self {
        self.shots_per_cycle = Some(shots);
        self
    }

    /// Sets the total length.
    #[must_use]
    pub const fn total_length(mut self, length: u32) -> Self {
        self.total_length = Some(length);
        self
    }

    /// Sets the frequency divider.
    #[must_use]
    pub const fn divider(mut self, divider: u32) -> Self {
        self.divider = Some(divider);
        self
    }
}
