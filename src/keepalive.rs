//! Background keep-alive polling.
//!
//! A QSmart laser powers down when it is not polled for a while. The
//! keep-alive task sends `STATE` through the shared [`CommandChannel`] on a
//! fixed interval. Failed polls are logged and otherwise ignored; the task
//! has no way to report them to the client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::channel::CommandChannel;
use crate::protocol::{Command, registers};
use crate::transport::Transport;

/// Default interval between keep-alive polls.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct Shared {
    running: AtomicBool,
    wake: Notify,
    polls: AtomicU64,
    failures: AtomicU64,
}

/// Handle to a running keep-alive task.
pub struct KeepAlive {
    shared: Arc<Shared>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl KeepAlive {
    /// Spawns the keep-alive task.
    ///
    /// The first poll is sent immediately.
    #[must_use]
    pub fn start<T: Transport + 'static>(channel: CommandChannel<T>, interval: Duration) -> Self {
        let shared = Arc::new(Shared::default());
        shared.running.store(true, Ordering::SeqCst);

        tracing::info!("starting keep-alive every {:?}", interval);
        let task = tokio::spawn(run(channel, Arc::clone(&shared), interval));

        Self {
            shared,
            interval,
            task: Some(task),
        }
    }

    /// Returns the polling interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true until [`stop`](Self::stop) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Number of polls sent so far.
    #[must_use]
    pub fn polls(&self) -> u64 {
        self.shared.polls.load(Ordering::SeqCst)
    }

    /// Number of polls that failed.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.shared.failures.load(Ordering::SeqCst)
    }

    /// Stops the task and waits for it to exit.
    ///
    /// An in-flight poll is allowed to finish first.
    pub async fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.wake.notify_one();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("keep-alive task ended abnormally: {}", e);
            }
            tracing::info!("keep-alive stopped after {} polls", self.polls());
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<T: Transport>(channel: CommandChannel<T>, shared: Arc<Shared>, interval: Duration) {
    let command = Command::query(&registers::STATE);

    while shared.running.load(Ordering::SeqCst) {
        shared.polls.fetch_add(1, Ordering::SeqCst);
        match channel.request(&command).await {
            Ok(reply) if reply.is_error() => {
                shared.failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!("keep-alive poll rejected: {}", reply.primary);
            }
            Ok(reply) => tracing::trace!("keep-alive: {}", reply.primary),
            Err(e) => {
                shared.failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!("keep-alive poll failed: {}", e);
            }
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = shared.wake.notified() => {}
        }
    }
}
