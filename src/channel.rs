//! Synchronous request/reply channel over a shared transport.
//!
//! Every round trip holds the connection guard from the write until the
//! reply is fully framed, so a foreground command and the keep-alive poll
//! can never interleave on the wire. Only one request is in flight at a time.
//!
//! Once a command is written, its reply must be consumed in full. If the
//! round trip fails or is cancelled after the write, lines of that reply may
//! still be in flight and would be read as the answer to the next command.
//! The channel therefore closes the transport, and later requests fail with
//! `Error::NotConnected` until [`CommandChannel::connect`] is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::protocol::{Command, Reply, ReplyDecoder};
use crate::transport::Transport;

/// Transport plus guard, shared by the command handler and the keep-alive task.
pub struct CommandChannel<T> {
    transport: Arc<Mutex<T>>,
    desynced: Arc<AtomicBool>,
}

impl<T> Clone for CommandChannel<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            desynced: Arc::clone(&self.desynced),
        }
    }
}

impl<T: Transport> CommandChannel<T> {
    /// Creates a new channel owning the transport.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            desynced: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquires the connection guard for a sequence of round trips.
    ///
    /// Nothing else can use the connection until the session is dropped.
    pub async fn session(&self) -> Session<'_, T> {
        Session {
            transport: self.transport.lock().await,
            desynced: &self.desynced,
        }
    }

    /// Sends a command and returns the framed reply.
    ///
    /// The guard is released when this returns, on success or failure.
    pub async fn request(&self, command: &Command) -> Result<Reply> {
        self.session().await.request(command).await
    }

    /// Sends a command and returns the reply text.
    ///
    /// With `include_status` the status line of a value reply is appended
    /// after a line feed; otherwise only the primary line is returned.
    pub async fn send_and_receive(&self, command: &Command, include_status: bool) -> Result<String> {
        Ok(self.request(command).await?.into_text(include_status))
    }

    /// Returns true if the underlying transport is connected and in step
    /// with the laser.
    pub async fn is_connected(&self) -> bool {
        let transport = self.transport.lock().await;
        !self.desynced.load(Ordering::SeqCst) && transport.is_connected()
    }

    /// Opens the underlying transport.
    ///
    /// A transport closed after a failed round trip is reopened fresh.
    pub async fn connect(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        if self.desynced.swap(false, Ordering::SeqCst) {
            transport.disconnect().await?;
        }
        transport.connect().await
    }

    /// Closes the underlying transport.
    pub async fn disconnect(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        self.desynced.store(false, Ordering::SeqCst);
        transport.disconnect().await
    }
}

/// Exclusive use of the connection for several round trips.
pub struct Session<'a, T> {
    transport: MutexGuard<'a, T>,
    desynced: &'a AtomicBool,
}

/// Marks the channel out of step unless the round trip completes.
struct InFlight<'a> {
    desynced: &'a AtomicBool,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.desynced.store(true, Ordering::SeqCst);
        }
    }
}

impl<T: Transport> Session<'_, T> {
    /// Writes one command and reads lines until the reply is complete.
    pub async fn request(&mut self, command: &Command) -> Result<Reply> {
        if self.desynced.swap(false, Ordering::SeqCst) {
            tracing::warn!("closing connection left mid-reply by an earlier command");
            self.transport.disconnect().await?;
            return Err(Error::NotConnected);
        }

        let mut in_flight = InFlight {
            desynced: self.desynced,
            done: false,
        };
        let result = self.round_trip(command).await;
        match &result {
            Ok(reply) => tracing::debug!(
                "{command} -> {:?} ({} line(s))",
                reply.primary,
                reply.line_count()
            ),
            Err(Error::NotConnected) => {}
            Err(e) => {
                tracing::warn!("{command} failed mid-reply, closing connection: {e}");
                if let Err(close) = self.transport.disconnect().await {
                    tracing::debug!("close after failed reply: {close}");
                }
            }
        }
        in_flight.done = true;
        result
    }

    async fn round_trip(&mut self, command: &Command) -> Result<Reply> {
        tracing::debug!("sending {command}");
        self.transport.send_line(command.to_bytes()).await?;

        let mut decoder = ReplyDecoder::new();
        loop {
            let line = self.transport.read_line().await?;
            if let Some(reply) = decoder.push(line) {
                return Ok(reply);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::FrameError;
    use crate::protocol::registers::{CGTEMP, STATE};
    use crate::transport::mock::{MockTransport, STATUS_LINE};

    #[tokio::test]
    async fn test_value_reply() {
        let (transport, handle) = MockTransport::new();
        let channel = CommandChannel::new(transport);

        let text = channel
            .send_and_receive(&Command::query(&CGTEMP), false)
            .await
            .unwrap();
        assert_eq!(text, "CGTEMP = 21.50");

        let text = channel
            .send_and_receive(&Command::query(&CGTEMP), true)
            .await
            .unwrap();
        assert_eq!(text, format!("CGTEMP = 21.50\n{STATUS_LINE}"));
        assert_eq!(handle.sent(), vec!["CGTEMP", "CGTEMP"]);
    }

    #[tokio::test]
    async fn test_terminal_reply_reads_one_line() {
        let (transport, handle) = MockTransport::new();
        handle.script("RUN", &["ERROR 7", "stray"]);
        let channel = CommandChannel::new(transport);

        let reply = channel.request(&Command::keyword("RUN")).await.unwrap();
        assert_eq!(reply.primary, "ERROR 7");
        assert_eq!(reply.line_count(), 1);

        // The unread stray line now shifts the next reply by one.
        handle.script("STOP", &["OK"]);
        let reply = channel.request(&Command::keyword("STOP")).await.unwrap();
        assert!(handle.interleaved());
        assert_eq!(reply.primary, "stray");
        assert_eq!(reply.status.as_deref(), Some("OK"));
    }

    #[tokio::test]
    async fn test_missing_reply_times_out_and_closes() {
        let (transport, handle) = MockTransport::new();
        handle.script("STATE", &[]);
        let channel = CommandChannel::new(transport);

        let err = channel.request(&Command::query(&STATE)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(!channel.is_connected().await);

        // Guard was released on the failure path, but the link stays closed.
        let err = channel.request(&Command::query(&STATE)).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
        assert_eq!(handle.sent(), vec!["STATE"]);

        channel.connect().await.unwrap();
        let reply = channel.request(&Command::query(&STATE)).await.unwrap();
        assert_eq!(reply.primary, "STATE 2");
    }

    #[tokio::test]
    async fn test_bad_value_line_does_not_leak_status_line() {
        let (transport, handle) = MockTransport::new();
        handle.script("CGTEMP", &["CGTEMP = 21.5\u{b0}C", STATUS_LINE]);
        let channel = CommandChannel::new(transport);

        let err = channel.request(&Command::query(&CGTEMP)).await.unwrap_err();
        assert!(matches!(err, Error::Frame(FrameError::NotAscii)), "{err}");

        let err = channel.request(&Command::query(&STATE)).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected), "{err}");
        assert_eq!(handle.sent(), vec!["CGTEMP"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_request_closes_connection() {
        let (transport, handle) = MockTransport::new();
        let channel = CommandChannel::new(transport.with_read_delay(Duration::from_millis(50)));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            channel.request(&Command::query(&CGTEMP)),
        )
        .await;
        assert!(cancelled.is_err());
        assert!(!channel.is_connected().await);

        let err = channel.request(&Command::query(&STATE)).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected), "{err}");
        assert_eq!(handle.sent(), vec!["CGTEMP"]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_never_interleave() {
        let (transport, handle) = MockTransport::new();
        let channel = CommandChannel::new(transport.with_read_delay(Duration::from_millis(1)));

        let mut tasks = Vec::new();
        for i in 0..16 {
            let channel = channel.clone();
            tasks.push(tokio::spawn(async move {
                let register = if i % 2 == 0 { STATE } else { CGTEMP };
                let reply = channel.request(&Command::query(&register)).await.unwrap();
                assert!(reply.primary.starts_with(register.name), "{reply:?}");
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(!handle.interleaved());
        assert_eq!(handle.sent().len(), 16);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let (transport, _handle) = MockTransport::new();
        let channel = CommandChannel::new(transport);
        assert!(channel.is_connected().await);
        channel.disconnect().await.unwrap();
        assert!(!channel.is_connected().await);
        let err = channel.request(&Command::query(&STATE)).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
