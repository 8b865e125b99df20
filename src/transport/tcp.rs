//! TCP transport implementation.
//!
//! This module provides the persistent line-oriented TCP link used by QSmart
//! lasers on the LAN.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::{Error, FrameError, Result};
use crate::protocol::{LINE_TERMINATOR, MAX_LINE_LENGTH, decode_line, encode_line};
use crate::transport::Transport;

/// Default timeout for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for reading one line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for TCP transport.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Host name or IP address of the laser.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Timeout for each line read.
    pub read_timeout: Duration,
}

impl TcpConfig {
    /// Creates a new TCP configuration with default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TCP transport for QSmart communication.
pub struct TcpTransport {
    config: TcpConfig,
    reader: Option<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
}

impl TcpTransport {
    /// Creates a new, unconnected TCP transport.
    #[must_use]
    pub const fn new(config: TcpConfig) -> Self {
        Self {
            config,
            reader: None,
            writer: None,
        }
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TcpConfig {
        &self.config
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.writer.is_some() {
                return Ok(());
            }

            let address = self.config.address();
            tracing::info!("connecting to laser at {address}");

            let stream = tokio::time::timeout(
                self.config.connect_timeout,
                TcpStream::connect((self.config.host.as_str(), self.config.port)),
            )
            .await
            .map_err(|_| Error::timeout(self.config.connect_timeout))?
            .map_err(Error::Connection)?;

            if let Err(e) = stream.set_nodelay(true) {
                tracing::warn!("failed to set TCP_NODELAY: {}", e);
            }

            let (reader, writer) = stream.into_split();
            self.reader = Some(BufReader::new(reader));
            self.writer = Some(writer);

            tracing::info!("connected to laser at {address}");
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.reader = None;
            if let Some(mut writer) = self.writer.take() {
                tracing::info!("disconnecting from laser at {}", self.config.address());
                if let Err(e) = writer.shutdown().await {
                    tracing::debug!("shutdown failed: {}", e);
                }
            }
            Ok(())
        })
    }

    fn send_line(&mut self, line: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let writer = self.writer.as_mut().ok_or(Error::NotConnected)?;

            let frame = encode_line(&line);
            tracing::trace!("-> {}", String::from_utf8_lossy(&line));

            writer.write_all(&frame).await.map_err(Error::Connection)?;
            writer.flush().await.map_err(Error::Connection)?;
            Ok(())
        })
    }

    fn read_line(&mut self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            let timeout = self.config.read_timeout;
            let reader = self.reader.as_mut().ok_or(Error::NotConnected)?;

            // Room for the longest accepted line plus CR LF.
            let limit = MAX_LINE_LENGTH as u64 + 2;
            let mut bounded = (&mut *reader).take(limit);

            let mut buf = Vec::with_capacity(64);
            let n = tokio::time::timeout(timeout, bounded.read_until(LINE_TERMINATOR, &mut buf))
                .await
                .map_err(|_| Error::timeout(timeout))?
                .map_err(Error::Connection)?;

            if buf.last() != Some(&LINE_TERMINATOR) && n as u64 == limit {
                return Err(FrameError::TooLong {
                    size: n,
                    max: MAX_LINE_LENGTH,
                }
                .into());
            }
            if n == 0 || buf.last() != Some(&LINE_TERMINATOR) {
                tracing::debug!("laser closed the connection");
                return Err(Error::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by laser",
                )));
            }

            let line = decode_line(&buf)?;
            tracing::trace!("<- {}", line);
            Ok(line)
        })
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}
