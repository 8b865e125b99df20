//! Laser operating state.

use std::fmt;

/// Operating state reported by the `STATE` register.
///
/// The laser walks through these in order from boot to a stabilized
/// harmonic output. The client only observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LaserState {
    /// Boot failure or fault.
    BootFault = 0,
    /// Warming up.
    WarmUp = 1,
    /// Ready; the flashlamp can be started.
    Ready = 2,
    /// Flashlamp running, Q-switch disabled.
    FlashingLampDisabled = 3,
    /// Flashlamp running, waiting for the shutter.
    FlashingAwaitingShutter = 4,
    /// Flashlamp running; the Q-switch can be enabled.
    FlashingPulseEnabled = 5,
    /// Nonlinear optics warming up.
    NloWarmUp = 6,
    /// Harmonic output stabilized.
    HarmonicStabilized = 7,
    /// Nonlinear optics optimization.
    NloOptimization = 8,
    /// APM ready.
    ApmReady = 9,
}

impl LaserState {
    /// Converts a state code to a `LaserState`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::BootFault),
            1 => Some(Self::WarmUp),
            2 => Some(Self::Ready),
            3 => Some(Self::FlashingLampDisabled),
            4 => Some(Self::FlashingAwaitingShutter),
            5 => Some(Self::FlashingPulseEnabled),
            6 => Some(Self::NloWarmUp),
            7 => Some(Self::HarmonicStabilized),
            8 => Some(Self::NloOptimization),
            9 => Some(Self::ApmReady),
            _ => None,
        }
    }

    /// Returns the state code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable phase name.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BootFault => "Boot Fault",
            Self::WarmUp => "Warm up",
            Self::Ready => "Laser ready for RUN command",
            Self::FlashingLampDisabled => "Flashing -- lamp disabled",
            Self::FlashingAwaitingShutter => "Flashing -- awaiting for shutter to be opened",
            Self::FlashingPulseEnabled => "Flashing -- Pulse enabled",
            Self::NloWarmUp => "Pulsed Laser ON, NLO warm up",
            Self::HarmonicStabilized => "Harmonic generator thermally stabilized",
            Self::NloOptimization => "NLO Optimization",
            Self::ApmReady => "APM ok : NLO ready",
        }
    }

    /// The flashlamp can be started with `RUN`.
    #[must_use]
    pub const fn is_ready_for_flashlamp(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// The Q-switch can be enabled.
    #[must_use]
    pub const fn is_ready_for_qswitch(self) -> bool {
        matches!(self, Self::FlashingPulseEnabled)
    }
}

impl fmt::Display for LaserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}
