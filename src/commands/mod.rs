//! Command handlers for QSmart operations.
//!
//! This module provides typed get/set functions for the laser's registers
//! on top of the [`CommandChannel`]. Every register follows the same shape:
//! a bare name reads it, the name plus a value writes it, and any reply
//! containing `ERROR` is a failure.

mod mode;
mod trigger;

use std::fmt;
use std::str::FromStr;

use crate::channel::{CommandChannel, Session};
use crate::error::{Error, Result};
use crate::protocol::{Command, Register, actions, parse_register, registers};
use crate::transport::Transport;
use crate::types::LaserState;

/// Reads and parses one register inside a session.
async fn read_register<T, V>(session: &mut Session<'_, T>, register: &Register) -> Result<V>
where
    T: Transport,
    V: FromStr,
{
    let reply = session.request(&Command::query(register)).await?;
    parse_register(register, &reply.primary)
}

/// Sends a command inside a session and expects an acknowledgement.
async fn execute_in<T: Transport>(session: &mut Session<'_, T>, command: &Command) -> Result<()> {
    let reply = session.request(command).await?;
    if reply.is_error() {
        return Err(Error::protocol(format!("{command}: {}", reply.primary)));
    }
    Ok(())
}

/// Command handler for QSmart operations.
pub struct CommandHandler<T> {
    channel: CommandChannel<T>,
    admin_mode: bool,
}

impl<T: Transport> CommandHandler<T> {
    /// Creates a new command handler.
    ///
    /// `admin_mode` unlocks writes to protected registers and is fixed for
    /// the lifetime of the handler.
    #[must_use]
    pub const fn new(channel: CommandChannel<T>, admin_mode: bool) -> Self {
        Self {
            channel,
            admin_mode,
        }
    }

    /// Returns true if protected registers may be written.
    #[must_use]
    pub const fn admin_mode(&self) -> bool {
        self.admin_mode
    }

    /// Returns the underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &CommandChannel<T> {
        &self.channel
    }

    fn check_writable(&self, register: &Register) -> Result<()> {
        if !register.is_writable() {
            return Err(Error::validation(format!("{register} is read-only")));
        }
        if register.admin && !self.admin_mode {
            tracing::warn!("refused write to protected register {register}");
            return Err(Error::Permission {
                register: register.name.to_string(),
            });
        }
        Ok(())
    }

    // ==================== Generic Access ====================

    /// Reads a register and parses it as `V`.
    pub async fn get<V: FromStr>(&self, register: &Register) -> Result<V> {
        let mut session = self.channel.session().await;
        read_register(&mut session, register).await
    }

    /// Writes a register.
    ///
    /// Protected registers fail with `Error::Permission` before anything is
    /// sent unless the handler is in admin mode.
    pub async fn set(&self, register: &Register, value: impl fmt::Display + Send) -> Result<()> {
        self.check_writable(register)?;
        self.execute(&Command::write(register, value)).await
    }

    /// Sends a command and expects an acknowledgement.
    pub async fn execute(&self, command: &Command) -> Result<()> {
        let mut session = self.channel.session().await;
        execute_in(&mut session, command).await
    }

    /// Sends arbitrary text and returns the reply, unparsed.
    pub async fn send_raw(&self, text: &str, include_status: bool) -> Result<String> {
        let command = Command::raw(text)?;
        self.channel.send_and_receive(&command, include_status).await
    }

    // ==================== System Commands ====================

    /// Gets the operating state.
    pub async fn get_state(&self) -> Result<LaserState> {
        let code: u8 = self.get(&registers::STATE).await?;
        LaserState::from_code(code)
            .ok_or_else(|| Error::protocol(format!("unknown laser state {code}")))
    }

    /// Gets the free-text status summary.
    pub async fn get_status(&self) -> Result<String> {
        self.get(&registers::STATUS).await
    }

    /// Gets the cooling group temperature in degrees Celsius.
    pub async fn get_cooling_temperature(&self) -> Result<f64> {
        self.get(&registers::CGTEMP).await
    }

    /// Gets the power supply firmware version.
    pub async fn get_power_supply_version(&self) -> Result<f64> {
        self.get(&registers::PSVERS).await
    }

    /// Gets the laser brain firmware version.
    pub async fn get_laser_brain_version(&self) -> Result<f64> {
        self.get(&registers::LVERS).await
    }

    /// Gets the user interface firmware version.
    pub async fn get_ui_version(&self) -> Result<f64> {
        self.get(&registers::UIVERS).await
    }

    /// Gets the serial number check setting.
    pub async fn get_serial_check(&self) -> Result<bool> {
        let value: u8 = self.get(&registers::CHKSERIAL).await?;
        Ok(value != 0)
    }

    /// Enables or disables the serial number check. Admin only.
    pub async fn set_serial_check(&self, enabled: bool) -> Result<()> {
        self.set(&registers::CHKSERIAL, u8::from(enabled)).await
    }

    /// Enables or disables command echo. Admin only.
    pub async fn set_echo(&self, enabled: bool) -> Result<()> {
        self.set(&registers::ECHO, u8::from(enabled)).await
    }

    // ==================== Flashlamp Commands ====================

    /// Gets the flashlamp voltage in volts.
    pub async fn get_flashlamp_voltage(&self) -> Result<u32> {
        self.get(&registers::CAPVSET).await
    }

    /// Sets the flashlamp voltage in volts. Admin only.
    pub async fn set_flashlamp_voltage(&self, volts: u32) -> Result<()> {
        self.set(&registers::CAPVSET, volts).await
    }

    /// Gets the flashlamp pulse width in microseconds.
    pub async fn get_pulse_width(&self) -> Result<u32> {
        self.get(&registers::LPW).await
    }

    /// Sets the flashlamp pulse width in microseconds. Admin only.
    pub async fn set_pulse_width(&self, micros: u32) -> Result<()> {
        self.set(&registers::LPW, micros).await
    }

    /// Gets the total shot counter.
    pub async fn get_system_shots(&self) -> Result<u64> {
        self.get(&registers::SSHOT).await
    }

    /// Gets the user shot counter.
    pub async fn get_user_shots(&self) -> Result<u64> {
        self.get(&registers::USHOT).await
    }

    /// Resets the user shot counter. Admin only.
    pub async fn reset_user_shots(&self) -> Result<()> {
        self.set(&registers::USHOT, 0).await
    }

    /// Starts the flashlamp (`RUN`).
    pub async fn enable_flashlamp(&self) -> Result<()> {
        self.execute(&Command::keyword(actions::RUN)).await
    }

    /// Stops the flashlamp (`STOP`).
    pub async fn disable_flashlamp(&self) -> Result<()> {
        self.execute(&Command::keyword(actions::STOP)).await
    }

    // ==================== Q-Switch Commands ====================

    /// Gets the Q-switch delay in nanoseconds.
    pub async fn get_qswitch_delay(&self) -> Result<u8> {
        self.get(&registers::QDLY).await
    }

    /// Sets the Q-switch delay in nanoseconds. Admin only.
    pub async fn set_qswitch_delay(&self, nanos: u8) -> Result<()> {
        self.set(&registers::QDLY, nanos).await
    }

    /// Gets the Q-switch delay offset in nanoseconds.
    pub async fn get_qswitch_delay_offset(&self) -> Result<i32> {
        self.get(&registers::QDLYO).await
    }

    /// Sets the Q-switch delay offset in nanoseconds.
    pub async fn set_qswitch_delay_offset(&self, nanos: i32) -> Result<()> {
        self.set(&registers::QDLYO, nanos).await
    }

    /// Enables Q-switch pulses (`QSW 1`).
    pub async fn enable_qswitch(&self) -> Result<()> {
        self.execute(&Command::keyword_with(actions::QSW, 1)).await
    }

    /// Disables Q-switch pulses (`QSW 0`).
    pub async fn disable_qswitch(&self) -> Result<()> {
        self.execute(&Command::keyword_with(actions::QSW, 0)).await
    }

    // ==================== Control Commands ====================

    /// Hands control to the front panel (`SSWITCH 1`).
    ///
    /// The laser stops answering this client afterwards.
    pub async fn switch_to_front_panel(&self) -> Result<()> {
        self.execute(&Command::keyword_with(actions::SSWITCH, 1)).await
    }
}
