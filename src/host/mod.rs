//! Plumbing between the model context and the host renderer.
//!
//! The host calls back into the model by function name with an encoded
//! payload. Those calls originate on the host's own thread, so they are queued
//! through a [`HostSender`] and replayed on the model context by
//! [`HostInbox::drain`]. Outbound frames pass through a [`FrameTracker`] that
//! remembers a digest per view and reports whether anything changed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use blake3::Hash;
use serde_json::json;

use crate::error::{Result, StackError};
use crate::logging::{HOST_TARGET, LogLevel, Logger, emit, json_kv};

pub type NativeFunc = Rc<dyn Fn(&[u8])>;

/// Named callbacks a view exposes to the host.
#[derive(Clone, Default)]
pub struct NativeFuncs {
    funcs: BTreeMap<String, NativeFunc>,
}

impl NativeFuncs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&[u8]) + 'static,
    {
        self.funcs.insert(name.into(), Rc::new(func));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    pub fn call(&self, name: &str, payload: &[u8]) -> Result<()> {
        let func = self
            .funcs
            .get(name)
            .ok_or_else(|| StackError::UnknownNativeFunction(name.to_string()))?;
        func(payload);
        Ok(())
    }
}

impl fmt::Debug for NativeFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

/// A function call requested by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEvent {
    pub func: String,
    pub payload: Vec<u8>,
}

/// Host-side handle. `Send`, so it can live on the renderer's thread.
#[derive(Debug, Clone)]
pub struct HostSender {
    tx: Sender<HostEvent>,
}

impl HostSender {
    pub fn send(&self, func: impl Into<String>, payload: Vec<u8>) -> Result<()> {
        self.tx
            .send(HostEvent {
                func: func.into(),
                payload,
            })
            .map_err(|_| StackError::HostDisconnected)
    }
}

/// Model-side end of the host channel.
pub struct HostInbox {
    rx: Receiver<HostEvent>,
    logger: Option<Logger>,
}

pub fn channel() -> (HostSender, HostInbox) {
    let (tx, rx) = mpsc::channel();
    (HostSender { tx }, HostInbox { rx, logger: None })
}

impl HostInbox {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Dispatch every queued event to `funcs`. Returns how many were handled;
    /// calls to unknown functions are logged and skipped.
    pub fn drain(&self, funcs: &NativeFuncs) -> Result<usize> {
        let mut handled = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => match funcs.call(&event.func, &event.payload) {
                    Ok(()) => handled += 1,
                    Err(err) => emit(
                        self.logger.as_ref(),
                        LogLevel::Warn,
                        HOST_TARGET,
                        "unknown_native_function",
                        [
                            json_kv("func", json!(event.func)),
                            json_kv("error", json!(err.to_string())),
                        ],
                    ),
                },
                Err(TryRecvError::Empty) => return Ok(handled),
                Err(TryRecvError::Disconnected) if handled > 0 => return Ok(handled),
                Err(TryRecvError::Disconnected) => return Err(StackError::HostDisconnected),
            }
        }
    }
}

/// Remembers the digest of the last frame committed per view key.
#[derive(Debug, Default)]
pub struct FrameTracker {
    last: HashMap<String, Hash>,
}

impl FrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` for `key`; true when it differs from the previous frame.
    pub fn commit(&mut self, key: &str, state: &[u8]) -> bool {
        let digest = blake3::hash(state);
        match self.last.insert(key.to_string(), digest) {
            Some(previous) => previous != digest,
            None => true,
        }
    }

    pub fn forget(&mut self, key: &str) {
        self.last.remove(key);
    }

    pub fn tracked(&self) -> usize {
        self.last.len()
    }
}
