//! Purpose: Define the call seam between sessions and the native engine.
//! Exports: `Engine`, `RawHandle`, `HandleSlot`.
//! Role: Every native call the session or event loop makes goes through an
//! `Engine` implementation; tests substitute a scripted one.
//! Invariants: A cleared `HandleSlot` stays cleared; callers see `Uninitialized`.

use std::os::raw::c_void;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::core::error::{Error, ErrorCode, ErrorKind};
use crate::core::events::{Event, EventKind};
use crate::core::format::{Format, LogLevel, SubApi};
use crate::core::libmpv::sys;
use crate::core::node::NodeValue;

pub type RawHandle = *mut sys::mpv_handle;

/// The bound client-API surface at call granularity. Implementations marshal
/// values, translate negative return codes, and decode event records; callers
/// never touch raw symbols.
pub trait Engine: Send + Sync + 'static {
    fn api_version(&self) -> u64;
    fn error_reason(&self, code: ErrorCode) -> String;
    fn event_name(&self, kind: EventKind) -> String;

    fn create(&self) -> Result<RawHandle, Error>;
    fn initialize(&self, handle: RawHandle) -> Result<(), Error>;
    fn detach_destroy(&self, handle: RawHandle);
    fn terminate_destroy(&self, handle: RawHandle);

    fn set_option(&self, handle: RawHandle, name: &str, value: &NodeValue) -> Result<(), Error>;
    fn command(&self, handle: RawHandle, args: &[String]) -> Result<(), Error>;
    fn command_node(&self, handle: RawHandle, args: &[NodeValue]) -> Result<NodeValue, Error>;
    fn get_property(
        &self,
        handle: RawHandle,
        name: &str,
        format: Format,
    ) -> Result<NodeValue, Error>;
    fn set_property(&self, handle: RawHandle, name: &str, value: &NodeValue) -> Result<(), Error>;
    fn observe_property(
        &self,
        handle: RawHandle,
        key: u64,
        name: &str,
        format: Format,
    ) -> Result<(), Error>;
    fn unobserve_property(&self, handle: RawHandle, key: u64) -> Result<(), Error>;
    fn request_event(&self, handle: RawHandle, kind: EventKind, enable: bool) -> Result<(), Error>;
    fn request_log_messages(&self, handle: RawHandle, level: LogLevel) -> Result<(), Error>;

    /// Block up to `timeout` seconds (negative blocks indefinitely) and decode
    /// the next event record. A timeout yields the `None` event.
    fn wait_event(&self, handle: RawHandle, timeout: f64) -> Result<Event, Error>;
    fn wakeup(&self, handle: RawHandle);
    fn set_wakeup_callback(&self, handle: RawHandle, callback: sys::mpv_wakeup_cb, ctx: *mut c_void);
    fn sub_api(&self, handle: RawHandle, what: SubApi) -> Result<*mut c_void, Error>;
}

/// Shared owner of the native handle pointer. The session and its event loop
/// both hold the slot; whichever side tears down swaps in null, and every
/// later caller fails instead of touching a dead handle.
pub struct HandleSlot {
    ptr: AtomicPtr<sys::mpv_handle>,
}

impl HandleSlot {
    pub fn new(handle: RawHandle) -> Self {
        Self {
            ptr: AtomicPtr::new(handle),
        }
    }

    pub fn get(&self) -> Result<RawHandle, Error> {
        let handle = self.ptr.load(Ordering::Acquire);
        if handle.is_null() {
            return Err(Error::new(ErrorKind::Uninitialized)
                .with_message("session handle is closed")
                .with_hint("Create a new session; this one has shut down."));
        }
        Ok(handle)
    }

    pub fn is_closed(&self) -> bool {
        self.ptr.load(Ordering::Acquire).is_null()
    }

    /// Swap the slot to null, returning the handle if it was still live.
    pub fn take(&self) -> Option<RawHandle> {
        let handle = self.ptr.swap(std::ptr::null_mut(), Ordering::AcqRel);
        if handle.is_null() { None } else { Some(handle) }
    }
}

#[cfg(test)]
mod tests {
    use super::HandleSlot;
    use crate::core::error::ErrorKind;

    fn dummy_handle() -> super::RawHandle {
        8usize as super::RawHandle
    }

    #[test]
    fn live_slot_hands_out_the_pointer() {
        let slot = HandleSlot::new(dummy_handle());
        assert!(!slot.is_closed());
        assert_eq!(slot.get().expect("live"), dummy_handle());
    }

    #[test]
    fn cleared_slot_fails_uninitialized() {
        let slot = HandleSlot::new(dummy_handle());
        assert_eq!(slot.take(), Some(dummy_handle()));
        assert!(slot.is_closed());
        let err = slot.get().expect_err("closed");
        assert_eq!(err.kind(), ErrorKind::Uninitialized);
    }

    #[test]
    fn take_is_one_shot() {
        let slot = HandleSlot::new(dummy_handle());
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
        assert!(slot.take().is_none());
    }
}
