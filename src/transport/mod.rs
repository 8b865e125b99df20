//! Transport layer for QSmart communication.
//!
//! This module provides the abstraction over the line-oriented link to the
//! laser. Only TCP is implemented.

#[cfg(test)]
pub(crate) mod mock;
pub mod tcp;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::error::Result;

/// Trait for transport implementations.
pub trait Transport: Send + Sync {
    /// Connects to the device.
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Disconnects from the device.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Sends one command line; the transport appends the line terminator.
    fn send_line(&mut self, line: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Reads one line, terminator excluded.
    fn read_line(&mut self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;
}

pub use tcp::{TcpConfig, TcpTransport};
