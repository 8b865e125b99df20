//! Scripted in-memory laser for tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::decode_line;
use crate::transport::Transport;

/// Status line the simulated laser sends after a value line.
pub(crate) const STATUS_LINE: &str = "0";

const DEFAULT_REGISTERS: &[(&str, &str)] = &[
    ("STATE", "2"),
    ("STATUS", "lamp off, qsw off"),
    ("CGTEMP", "21.50"),
    ("PSVERS", "1.05"),
    ("LVERS", "2.10"),
    ("UIVERS", "3.00"),
    ("CHKSERIAL", "1"),
    ("ECHO", "0"),
    ("CAPVSET", "1200"),
    ("LPW", "180"),
    ("SSHOT", "123456"),
    ("USHOT", "42"),
    ("TRIG", "II"),
    ("QSPAR1", "0"),
    ("QSPAR2", "20"),
    ("QSPAR3", "10"),
    ("QDLY", "150"),
    ("QDLYO", "10"),
    ("QSW", "0"),
    ("FLASH", "0"),
];

/// Shared view of a [`MockTransport`], kept by the test after the
/// transport moves into a client.
#[derive(Clone, Default)]
pub(crate) struct MockHandle {
    registers: Arc<Mutex<HashMap<String, String>>>,
    scripted: Arc<Mutex<HashMap<String, VecDeque<Vec<String>>>>>,
    sent: Arc<Mutex<Vec<String>>>,
    interleaved: Arc<AtomicBool>,
}

impl MockHandle {
    /// Lines written so far, in order.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Lines written so far that carry a value.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|line| line.contains(' ') || matches!(line.as_str(), "RUN" | "STOP"))
            .collect()
    }

    pub(crate) fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub(crate) fn register(&self, name: &str) -> Option<String> {
        self.registers.lock().unwrap().get(name).cloned()
    }

    pub(crate) fn set_register(&self, name: &str, value: &str) {
        self.registers
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Queues a canned reply for the next time `command` is sent.
    pub(crate) fn script(&self, command: &str, lines: &[&str]) {
        self.scripted
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(lines.iter().map(|l| (*l).to_string()).collect());
    }

    /// True if a command was written while a reply was still unread.
    pub(crate) fn interleaved(&self) -> bool {
        self.interleaved.load(Ordering::SeqCst)
    }
}

/// In-memory transport answering like a QSmart laser.
pub(crate) struct MockTransport {
    handle: MockHandle,
    pending: VecDeque<String>,
    connected: bool,
    read_delay: Option<Duration>,
}

impl MockTransport {
    pub(crate) fn new() -> (Self, MockHandle) {
        let handle = MockHandle::default();
        {
            let mut registers = handle.registers.lock().unwrap();
            for (name, value) in DEFAULT_REGISTERS {
                registers.insert((*name).to_string(), (*value).to_string());
            }
        }
        let transport = Self {
            handle: handle.clone(),
            pending: VecDeque::new(),
            connected: true,
            read_delay: None,
        };
        (transport, handle)
    }

    /// Delays every line read, to widen race windows.
    pub(crate) fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    fn respond(&self, line: &str) -> Vec<String> {
        if let Some(lines) = self
            .handle
            .scripted
            .lock()
            .unwrap()
            .get_mut(line)
            .and_then(VecDeque::pop_front)
        {
            return lines;
        }

        let mut registers = self.handle.registers.lock().unwrap();
        match line {
            "RUN" => {
                registers.insert("FLASH".into(), "1".into());
                return vec!["OK".into()];
            }
            "STOP" => {
                registers.insert("FLASH".into(), "0".into());
                return vec!["OK".into()];
            }
            _ => {}
        }

        let assignment = line
            .split_once(" = ")
            .or_else(|| line.split_once(' '))
            .map(|(name, value)| (name.trim(), value.trim()));

        match assignment {
            Some(("SSWITCH", "1")) => vec!["OK".into()],
            Some((name, value)) if registers.contains_key(name) => {
                registers.insert(name.to_string(), value.to_string());
                vec!["OK".into()]
            }
            Some(_) => vec!["ERROR 2".into()],
            None => match registers.get(line) {
                Some(value) if line == "STATE" => {
                    vec![format!("STATE {value}"), STATUS_LINE.into()]
                }
                Some(value) => vec![format!("{line} = {value}"), STATUS_LINE.into()],
                None => vec!["ERROR 1".into()],
            },
        }
    }
}

impl Transport for MockTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.connected = false;
            self.pending.clear();
            Ok(())
        })
    }

    fn send_line(&mut self, line: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if !self.connected {
                return Err(Error::NotConnected);
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if !self.pending.is_empty() {
                self.handle.interleaved.store(true, Ordering::SeqCst);
            }
            self.handle.sent.lock().unwrap().push(line.clone());
            let reply = self.respond(&line);
            self.pending.extend(reply);
            Ok(())
        })
    }

    fn read_line(&mut self) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            if !self.connected {
                return Err(Error::NotConnected);
            }
            if let Some(delay) = self.read_delay {
                tokio::time::sleep(delay).await;
            }
            let line = self
                .pending
                .pop_front()
                .ok_or(Error::Timeout { timeout_ms: 0 })?;
            Ok(decode_line(line.as_bytes())?)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
