//! Main [`QSmart`] client implementation.
//!
//! This module provides the high-level [`QSmart`] client that combines the
//! transport, the command handler and the keep-alive task.

use std::io;
use std::time::Duration;

use crate::channel::CommandChannel;
use crate::commands::CommandHandler;
use crate::error::{Error, Result};
use crate::keepalive::{DEFAULT_KEEP_ALIVE_INTERVAL, KeepAlive};
use crate::transport::{TcpConfig, TcpTransport, Transport};
use crate::types::{FirmwareVersions, LaserState};

/// Configuration for a [`QSmart`] client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP endpoint and timeouts.
    pub tcp: TcpConfig,
    /// Unlocks writes to protected registers.
    pub admin_mode: bool,
    /// Start the keep-alive task on connect.
    pub keep_alive: bool,
    /// Interval between keep-alive polls.
    pub keep_alive_interval: Duration,
}

impl ClientConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_tcp(TcpConfig::new(host, port))
    }

    /// Creates a configuration from an existing TCP configuration.
    #[must_use]
    pub const fn with_tcp(tcp: TcpConfig) -> Self {
        Self {
            tcp,
            admin_mode: false,
            keep_alive: true,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
        }
    }

    /// Sets admin mode.
    #[must_use]
    pub const fn admin_mode(mut self, enabled: bool) -> Self {
        self.admin_mode = enabled;
        self
    }

    /// Enables or disables the keep-alive task on connect.
    #[must_use]
    pub const fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub const fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.tcp.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.tcp.read_timeout = timeout;
        self
    }
}

/// Client for controlling a QSmart laser.
pub struct QSmart<T> {
    commands: CommandHandler<T>,
    firmware: FirmwareVersions,
    keep_alive: Option<KeepAlive>,
    keep_alive_interval: Duration,
}

impl QSmart<TcpTransport> {
    /// Connects to a laser over TCP.
    ///
    /// This will:
    /// 1. Open the TCP connection
    /// 2. Check the laser answers `STATE`
    /// 3. Read the firmware versions
    /// 4. Start the keep-alive task, unless disabled
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or the laser
    /// does not answer.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let mut transport = TcpTransport::new(config.tcp.clone());
        transport.connect().await?;
        Self::with_transport(transport, &config).await
    }
}

impl<T: Transport + 'static> QSmart<T> {
    /// Creates a client over an already connected transport.
    pub async fn with_transport(transport: T, config: &ClientConfig) -> Result<Self> {
        let channel = CommandChannel::new(transport);
        let commands = CommandHandler::new(channel, config.admin_mode);

        let state = commands.get_state().await.map_err(|e| match e {
            Error::Connection(_) | Error::Timeout { .. } | Error::NotConnected => e,
            other => Error::Connection(io::Error::other(format!(
                "unable to reach laser: {other}"
            ))),
        })?;
        tracing::info!("laser state: {state}");

        let firmware = FirmwareVersions {
            power_supply: commands.get_power_supply_version().await?,
            laser_brain: commands.get_laser_brain_version().await?,
        };
        tracing::info!(
            "firmware: power supply {}, laser brain {}",
            firmware.power_supply,
            firmware.laser_brain
        );

        let mut client = Self {
            commands,
            firmware,
            keep_alive: None,
            keep_alive_interval: config.keep_alive_interval,
        };
        if config.keep_alive {
            client.start_keep_alive();
        }
        Ok(client)
    }

    /// Returns the command handler for register access.
    #[must_use]
    pub const fn commands(&self) -> &CommandHandler<T> {
        &self.commands
    }

    /// Returns the firmware versions read on connect.
    #[must_use]
    pub const fn firmware(&self) -> FirmwareVersions {
        self.firmware
    }

    /// Returns true if protected registers may be written.
    #[must_use]
    pub const fn admin_mode(&self) -> bool {
        self.commands.admin_mode()
    }

    // ==================== Keep-Alive ====================

    /// Starts the keep-alive task if it is not already running.
    pub fn start_keep_alive(&mut self) {
        if self.keep_alive.is_none() {
            let channel = self.commands.channel().clone();
            self.keep_alive = Some(KeepAlive::start(channel, self.keep_alive_interval));
        }
    }

    /// Stops the keep-alive task and waits for it to exit.
    pub async fn stop_keep_alive(&mut self) {
        if let Some(mut keep_alive) = self.keep_alive.take() {
            keep_alive.stop().await;
        }
    }

    /// Returns true if the keep-alive task is running.
    #[must_use]
    pub fn is_keep_alive_running(&self) -> bool {
        self.keep_alive.as_ref().is_some_and(KeepAlive::is_running)
    }

    // ==================== State ====================

    /// Gets the operating state.
    pub async fn state(&self) -> Result<LaserState> {
        self.commands.get_state().await
    }

    /// Returns true if the flashlamp can be started.
    pub async fn is_ready_for_flashlamp(&self) -> Result<bool> {
        Ok(self.state().await?.is_ready_for_flashlamp())
    }

    /// Returns true if the Q-switch can be enabled.
    pub async fn is_ready_for_qswitch(&self) -> Result<bool> {
        Ok(self.state().await?.is_ready_for_qswitch())
    }

    // ==================== Lifecycle ====================

    /// Returns true if connected.
    pub async fn is_connected(&self) -> bool {
        self.commands.channel().is_connected().await
    }

    /// Stops the keep-alive task and closes the connection.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.stop_keep_alive().await;
        self.commands.channel().disconnect().await
    }

    /// Hands control to the laser's front panel and closes the connection.
    ///
    /// The laser ignores this client afterwards, so the client is consumed.
    pub async fn relinquish_control(mut self) -> Result<()> {
        self.stop_keep_alive().await;
        tracing::info!("handing control to the front panel");
        self.commands.switch_to_front_panel().await?;
        self.commands.channel().disconnect().await
    }
}
