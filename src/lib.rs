//! # qsmart
//!
//! A Rust client library for Quantel/Lumibird QSmart lasers.
//!
//! The laser speaks a line-oriented ASCII protocol over TCP. This library
//! frames its replies, serializes all traffic over one connection, keeps the
//! laser awake with a background poll and exposes its registers as typed
//! getters and setters.
//!
//! ## Quick Start
//!
//! ```no_run
//! use qsmart::{ClientConfig, ModeSettings, QSmart};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), qsmart::Error> {
//!     let mut laser = QSmart::connect(ClientConfig::new("192.168.1.50", 10001)).await?;
//!
//!     let state = laser.state().await?;
//!     println!("State: {state}");
//!     println!("Cooling: {} C", laser.commands().get_cooling_temperature().await?);
//!
//!     laser
//!         .commands()
//!         .set_mode(ModeSettings::Scan {
//!             shots_per_cycle: 10,
//!             total_length: 20,
//!         })
//!         .await?;
//!
//!     laser.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`transport`] - Line transport (TCP)
//! - [`protocol`] - Reply framing, commands and the register catalog
//! - [`channel`] - Guarded request/reply channel
//! - [`commands`] - Typed register access
//! - [`keepalive`] - Background keep-alive polling
//! - [`client`] - High-level [`QSmart`] client

pub mod channel;
pub mod client;
pub mod commands;
pub mod error;
pub mod keepalive;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use channel::{CommandChannel, Session};
pub use client::{ClientConfig, QSmart};
pub use commands::CommandHandler;
pub use error::{Error, FrameError, Result};
pub use keepalive::{DEFAULT_KEEP_ALIVE_INTERVAL, KeepAlive};
pub use protocol::{Command, Register, Reply, ReplyDecoder, registers};
pub use transport::{TcpConfig, TcpTransport, Transport};
pub use types::{
    FirmwareVersions, LaserState, Mode, ModeParams, ModeRegisters, ModeSettings, TriggerConfig,
    TriggerSource,
};
