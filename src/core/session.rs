//! Purpose: Own one engine client handle and expose the playback surface.
//! Exports: `Session`, `MpvSession`, `SessionOptions`, `ObservationEntry`.
//! Role: Front door for property access, commands, observation bookkeeping,
//! and the quit handshake with the event worker.
//! Invariants: Property reads and writes are checked against the registry
//! before any native call.
//! Invariants: After `quit` returns, the handle slot is closed and every
//! operation fails with `Uninitialized`.

use std::collections::HashMap;
use std::ffi::c_void;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::dispatch::{self, EventHandler, EventLoop};
use crate::core::engine::{Engine, HandleSlot};
use crate::core::error::{Error, ErrorKind};
use crate::core::events::EventKind;
use crate::core::format::{split_api_version, Format, LogLevel, SubApi};
use crate::core::libmpv::{sys, LibMpv};
use crate::core::node::NodeValue;
use crate::core::registry;

/// Construction knobs for [`Session::create`].
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Explicit library path; the platform default name is used when absent.
    pub library: Option<PathBuf>,
    /// Options applied in order before initialize. Underscores in names are
    /// rewritten to hyphens.
    pub options: Vec<(String, NodeValue)>,
    /// When set, log message events at this level are requested right after
    /// initialize.
    pub log_level: Option<LogLevel>,
}

/// One registered property observation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObservationEntry {
    pub name: String,
    pub format: Format,
    pub key: u64,
}

/// A client connection to one engine instance. Operations may be called from
/// any thread; the engine serializes them internally. Event delivery runs on
/// the worker started by [`Session::start_events`].
pub struct Session<E: Engine> {
    engine: Arc<E>,
    slot: Arc<HandleSlot>,
    observations: Mutex<HashMap<u64, ObservationEntry>>,
    event_loop: Mutex<Option<EventLoop>>,
}

pub type MpvSession = Session<LibMpv>;

impl Session<LibMpv> {
    /// Load the native library and build a session from `options`.
    pub fn create(options: &SessionOptions) -> Result<Self, Error> {
        let engine = LibMpv::load(options.library.as_deref())?;
        Session::with_engine(engine, options)
    }
}

impl<E: Engine> Session<E> {
    /// Build a session on an already loaded engine: create the client handle,
    /// apply each option, then initialize. Individual option failures are
    /// logged and skipped; an initialize failure tears the handle down and is
    /// fatal.
    pub fn with_engine(engine: Arc<E>, options: &SessionOptions) -> Result<Self, Error> {
        let handle = engine.create()?;
        let session = Session {
            engine,
            slot: Arc::new(HandleSlot::new(handle)),
            observations: Mutex::new(HashMap::new()),
            event_loop: Mutex::new(None),
        };
        for (name, value) in &options.options {
            let name = name.replace('_', "-");
            if let Err(err) = session.engine.set_option(handle, &name, value) {
                debug!(option = %name, error = %err, "option rejected");
            }
        }
        if let Err(err) = session.engine.initialize(handle) {
            if let Some(handle) = session.slot.take() {
                session.engine.terminate_destroy(handle);
            }
            return Err(err);
        }
        if let Some(level) = options.log_level {
            session.engine.request_log_messages(handle, level)?;
        }
        Ok(session)
    }

    /// Major and minor version of the loaded client API.
    pub fn api_version(&self) -> (u16, u16) {
        split_api_version(self.engine.api_version())
    }

    /// True once the handle has been released by `quit` or the event worker.
    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }

    /// Read a property in its registry wire format.
    pub fn get_property(&self, name: &str) -> Result<NodeValue, Error> {
        let spec = registry::find(name).ok_or_else(|| registry::unknown_property_error(name))?;
        if !spec.access.allows_read() {
            return Err(registry::access_denied_error(name, "read"));
        }
        let handle = self.slot.get()?;
        self.engine.get_property(handle, name, spec.format)
    }

    /// Read a property as the engine's display string.
    pub fn get_property_osd(&self, name: &str) -> Result<String, Error> {
        let spec = registry::find(name).ok_or_else(|| registry::unknown_property_error(name))?;
        if !spec.access.allows_read() {
            return Err(registry::access_denied_error(name, "read"));
        }
        let handle = self.slot.get()?;
        match self.engine.get_property(handle, name, Format::OsdString)? {
            NodeValue::String(text) => Ok(text),
            other => Err(Error::new(ErrorKind::Internal)
                .with_function("mpv_get_property")
                .with_message(format!(
                    "osd read of `{name}` produced a {:?} value",
                    other.format()
                ))),
        }
    }

    pub fn set_property(&self, name: &str, value: impl Into<NodeValue>) -> Result<(), Error> {
        let spec = registry::find(name).ok_or_else(|| registry::unknown_property_error(name))?;
        if !spec.access.allows_write() {
            return Err(registry::access_denied_error(name, "write"));
        }
        let handle = self.slot.get()?;
        self.engine.set_property(handle, name, &value.into())
    }

    /// Issue a string command. Non-string arguments are stringified the way
    /// the engine's command parser expects, with flags as `yes`/`no`; `None`
    /// arguments are dropped entirely.
    pub fn command(&self, name: &str, args: &[NodeValue]) -> Result<(), Error> {
        let handle = self.slot.get()?;
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push(name.to_string());
        words.extend(args.iter().filter_map(command_word));
        self.engine.command(handle, &words)
    }

    /// Issue a node command and return the engine's node-typed reply.
    pub fn command_node(&self, args: &[NodeValue]) -> Result<NodeValue, Error> {
        let handle = self.slot.get()?;
        self.engine.command_node(handle, args)
    }

    /// Subscribe to change notifications for `name`. The wire format defaults
    /// to the registry entry and the correlation key to a stable hash of the
    /// name; the chosen key is returned and tags every matching
    /// `PROPERTY_CHANGE` event.
    pub fn observe_property(
        &self,
        name: &str,
        format: Option<Format>,
        key: Option<u64>,
    ) -> Result<u64, Error> {
        let spec = registry::find(name).ok_or_else(|| registry::unknown_property_error(name))?;
        let format = format.unwrap_or(spec.format);
        let key = key.unwrap_or_else(|| derived_key(name));
        let handle = self.slot.get()?;
        self.observations_guard().insert(
            key,
            ObservationEntry {
                name: name.to_string(),
                format,
                key,
            },
        );
        if let Err(err) = self.engine.observe_property(handle, key, name, format) {
            self.observations_guard().remove(&key);
            return Err(err);
        }
        Ok(key)
    }

    /// Drop the observation registered under `key`. Unknown keys are a no-op
    /// on the engine side.
    pub fn unobserve_property(&self, key: u64) -> Result<(), Error> {
        let handle = self.slot.get()?;
        self.observations_guard().remove(&key);
        self.engine.unobserve_property(handle, key)
    }

    /// Current observations, ordered by key.
    pub fn observations(&self) -> Vec<ObservationEntry> {
        let mut entries: Vec<ObservationEntry> =
            self.observations_guard().values().cloned().collect();
        entries.sort_by_key(|entry| entry.key);
        entries
    }

    pub fn request_log_messages(&self, level: LogLevel) -> Result<(), Error> {
        let handle = self.slot.get()?;
        self.engine.request_log_messages(handle, level)
    }

    pub fn request_event(&self, kind: EventKind, enable: bool) -> Result<(), Error> {
        let handle = self.slot.get()?;
        self.engine.request_event(handle, kind, enable)
    }

    /// Interrupt a pending `wait_event` on the worker.
    pub fn wakeup(&self) -> Result<(), Error> {
        let handle = self.slot.get()?;
        self.engine.wakeup(handle);
        Ok(())
    }

    /// Register a process-level wakeup callback.
    ///
    /// # Safety
    /// The engine may invoke `callback` with `ctx` from any of its internal
    /// threads until the session shuts down; both must stay valid that long,
    /// and the callback must not call back into session operations.
    pub unsafe fn set_wakeup_callback(
        &self,
        callback: sys::mpv_wakeup_cb,
        ctx: *mut c_void,
    ) -> Result<(), Error> {
        let handle = self.slot.get()?;
        self.engine.set_wakeup_callback(handle, callback, ctx);
        Ok(())
    }

    /// Raw pointer to an extension API table, for callers that bind one.
    pub fn sub_api(&self, what: SubApi) -> Result<*mut c_void, Error> {
        let handle = self.slot.get()?;
        self.engine.sub_api(handle, what)
    }

    /// Spawn the event worker delivering to `handler`. One worker per
    /// session; a second call fails.
    pub fn start_events(&self, handler: Arc<dyn EventHandler>) -> Result<(), Error> {
        let mut event_loop = self.loop_guard();
        if event_loop.is_some() {
            return Err(
                Error::new(ErrorKind::Usage).with_message("the event worker is already running")
            );
        }
        self.slot.get()?;
        *event_loop = Some(dispatch::spawn(
            self.engine.clone(),
            self.slot.clone(),
            handler,
        )?);
        Ok(())
    }

    /// Ask the engine to shut down and wait until the worker has observed it.
    /// With no worker running, the handle is terminated directly. Safe to
    /// call again afterwards.
    pub fn quit(&self) -> Result<(), Error> {
        let mut event_loop = self.loop_guard();
        let Some(mut running) = event_loop.take() else {
            if let Some(handle) = self.slot.take() {
                self.engine.terminate_destroy(handle);
            }
            return Ok(());
        };
        if let Ok(handle) = self.slot.get() {
            if let Err(err) = self.engine.command(handle, &["quit".to_string()]) {
                *event_loop = Some(running);
                return Err(err);
            }
        }
        let exit = running.await_exit();
        debug!(?exit, "session quit complete");
        Ok(())
    }

    fn observations_guard(&self) -> MutexGuard<'_, HashMap<u64, ObservationEntry>> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn loop_guard(&self) -> MutexGuard<'_, Option<EventLoop>> {
        self.event_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

// `None` yields no word at all; an empty word would shift every positional
// argument after it in the engine's command parser.
fn command_word(value: &NodeValue) -> Option<String> {
    match value {
        NodeValue::None => None,
        NodeValue::String(text) => Some(text.clone()),
        NodeValue::Flag(true) => Some("yes".to_string()),
        NodeValue::Flag(false) => Some("no".to_string()),
        NodeValue::Int64(number) => Some(number.to_string()),
        NodeValue::Double(number) => Some(number.to_string()),
        other => Some(other.to_json().to_string()),
    }
}

/// Stable correlation key for a property name, from the first eight bytes of
/// its sha256 digest.
fn derived_key(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}
