//! Data types for QSmart lasers.

pub mod device;
pub mod mode;
pub mod state;
pub mod trigger;

pub use device::FirmwareVersions;
pub use mode::{Mode, ModeParams, ModeRegisters, ModeSettings};
pub use state::LaserState;
pub use trigger::{TriggerConfig, TriggerSource};
