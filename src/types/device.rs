//! Device information types.

/// Firmware versions read when the client connects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirmwareVersions {
    /// Power supply firmware (`PSVERS`).
    pub power_supply: f64,
    /// Laser brain firmware (`LVERS`).
    pub laser_brain: f64,
}
