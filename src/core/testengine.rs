// Scripted engine and recording handler shared by session and dispatch tests.
use std::collections::{HashMap, VecDeque};
use std::os::raw::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::core::dispatch::EventHandler;
use crate::core::engine::{Engine, RawHandle};
use crate::core::error::{Error, ErrorCode};
use crate::core::events::{Event, EventKind, EventPayload};
use crate::core::format::{EndFileReason, Format, LogLevel, SubApi};
use crate::core::libmpv::sys;
use crate::core::node::NodeValue;

#[derive(Default)]
struct FakeState {
    queue: VecDeque<Event>,
    properties: HashMap<String, NodeValue>,
    observations: HashMap<u64, (String, Format)>,
    calls: Vec<String>,
    handles_created: usize,
    detached: usize,
    terminated: usize,
    fail_commands: HashMap<String, ErrorCode>,
    fail_options: HashMap<String, ErrorCode>,
    fail_initialize: Option<ErrorCode>,
    command_node_reply: Option<NodeValue>,
}

/// In-memory engine with a scriptable event queue. Property sets feed
/// matching observations back through the queue, and a `quit` command queues
/// the shutdown event the way the real engine does.
#[derive(Default)]
pub(crate) struct FakeEngine {
    state: Mutex<FakeState>,
    ready: Condvar,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_event(&self, event: Event) {
        let mut state = self.state.lock().expect("lock");
        state.queue.push_back(event);
        self.ready.notify_all();
    }

    pub(crate) fn preset_property(&self, name: &str, value: NodeValue) {
        let mut state = self.state.lock().expect("lock");
        state.properties.insert(name.to_string(), value);
    }

    pub(crate) fn fail_command(&self, name: &str, code: ErrorCode) {
        let mut state = self.state.lock().expect("lock");
        state.fail_commands.insert(name.to_string(), code);
    }

    pub(crate) fn fail_option(&self, name: &str, code: ErrorCode) {
        let mut state = self.state.lock().expect("lock");
        state.fail_options.insert(name.to_string(), code);
    }

    pub(crate) fn fail_initialize(&self, code: ErrorCode) {
        let mut state = self.state.lock().expect("lock");
        state.fail_initialize = Some(code);
    }

    pub(crate) fn script_command_node_reply(&self, reply: NodeValue) {
        let mut state = self.state.lock().expect("lock");
        state.command_node_reply = Some(reply);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().expect("lock").calls.clone()
    }

    pub(crate) fn detach_count(&self) -> usize {
        self.state.lock().expect("lock").detached
    }

    pub(crate) fn terminate_count(&self) -> usize {
        self.state.lock().expect("lock").terminated
    }

    pub(crate) fn observation_count(&self) -> usize {
        self.state.lock().expect("lock").observations.len()
    }

    pub(crate) fn stored_property(&self, name: &str) -> Option<NodeValue> {
        self.state.lock().expect("lock").properties.get(name).cloned()
    }

    fn record(&self, call: String) {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(call);
    }
}

impl Engine for FakeEngine {
    fn api_version(&self) -> u64 {
        (1 << 16) | 109
    }

    fn error_reason(&self, code: ErrorCode) -> String {
        format!("error code {}", code.as_raw())
    }

    fn event_name(&self, kind: EventKind) -> String {
        kind.name().to_string()
    }

    fn create(&self) -> Result<RawHandle, Error> {
        let mut state = self.state.lock().expect("lock");
        state.handles_created += 1;
        state.calls.push("create".to_string());
        Ok((8 * state.handles_created) as RawHandle)
    }

    fn initialize(&self, _handle: RawHandle) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push("initialize".to_string());
        match state.fail_initialize {
            Some(code) => Err(Error::native(
                "mpv_initialize",
                code,
                reason_text(code),
                Vec::new(),
            )),
            None => Ok(()),
        }
    }

    fn detach_destroy(&self, _handle: RawHandle) {
        let mut state = self.state.lock().expect("lock");
        state.detached += 1;
        state.calls.push("detach_destroy".to_string());
    }

    fn terminate_destroy(&self, _handle: RawHandle) {
        let mut state = self.state.lock().expect("lock");
        state.terminated += 1;
        state.calls.push("terminate_destroy".to_string());
    }

    fn set_option(&self, _handle: RawHandle, name: &str, value: &NodeValue) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("set_option {name}"));
        if let Some(code) = state.fail_options.get(name).copied() {
            return Err(Error::native(
                "mpv_set_option",
                code,
                reason_text(code),
                vec![name.to_string()],
            ));
        }
        state.properties.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn command(&self, _handle: RawHandle, args: &[String]) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("command {}", args.join(" ")));
        let name = args.first().cloned().unwrap_or_default();
        if let Some(code) = state.fail_commands.get(&name).copied() {
            return Err(Error::native(
                "mpv_command",
                code,
                reason_text(code),
                args.to_vec(),
            ));
        }
        if name == "quit" {
            state.queue.push_back(Event::bare(EventKind::Shutdown));
            self.ready.notify_all();
        }
        Ok(())
    }

    fn command_node(&self, _handle: RawHandle, args: &[NodeValue]) -> Result<NodeValue, Error> {
        let mut state = self.state.lock().expect("lock");
        let name = match args.first() {
            Some(NodeValue::String(name)) => name.clone(),
            _ => String::new(),
        };
        let words: Vec<String> = args.iter().map(node_word).collect();
        state.calls.push(format!("command_node {}", words.join(" ")));
        if let Some(code) = state.fail_commands.get(&name).copied() {
            return Err(Error::native(
                "mpv_command_node",
                code,
                reason_text(code),
                vec![name],
            ));
        }
        if name == "quit" {
            state.queue.push_back(Event::bare(EventKind::Shutdown));
        }
        self.ready.notify_all();
        Ok(state.command_node_reply.clone().unwrap_or(NodeValue::None))
    }

    fn get_property(
        &self,
        _handle: RawHandle,
        name: &str,
        _format: Format,
    ) -> Result<NodeValue, Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("get_property {name}"));
        match state.properties.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(Error::native(
                "mpv_get_property",
                ErrorCode::PropertyUnavailable,
                reason_text(ErrorCode::PropertyUnavailable),
                vec![name.to_string()],
            )),
        }
    }

    fn set_property(&self, _handle: RawHandle, name: &str, value: &NodeValue) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("set_property {name}"));
        state.properties.insert(name.to_string(), value.clone());
        let matching: Vec<u64> = state
            .observations
            .iter()
            .filter(|(_, (observed, _))| observed == name)
            .map(|(key, _)| *key)
            .collect();
        for key in matching {
            state.queue.push_back(Event {
                kind: EventKind::PropertyChange,
                error: None,
                reply_key: key,
                payload: Some(EventPayload::PropertyChange {
                    name: name.to_string(),
                    value: value.clone(),
                }),
            });
        }
        if !state.queue.is_empty() {
            self.ready.notify_all();
        }
        Ok(())
    }

    fn observe_property(
        &self,
        _handle: RawHandle,
        key: u64,
        name: &str,
        format: Format,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("observe_property {key} {name}"));
        state.observations.insert(key, (name.to_string(), format));
        Ok(())
    }

    fn unobserve_property(&self, _handle: RawHandle, key: u64) -> Result<(), Error> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(format!("unobserve_property {key}"));
        state.observations.remove(&key);
        Ok(())
    }

    fn request_event(&self, _handle: RawHandle, kind: EventKind, enable: bool) -> Result<(), Error> {
        self.record(format!("request_event {} {enable}", kind.name()));
        Ok(())
    }

    fn request_log_messages(&self, _handle: RawHandle, level: LogLevel) -> Result<(), Error> {
        self.record(format!("request_log_messages {}", level.as_str()));
        Ok(())
    }

    fn wait_event(&self, _handle: RawHandle, timeout: f64) -> Result<Event, Error> {
        let mut state = self.state.lock().expect("lock");
        loop {
            if let Some(event) = state.queue.pop_front() {
                return Ok(event);
            }
            if timeout < 0.0 {
                state = self.ready.wait(state).expect("wait");
            } else {
                let (next, result) = self
                    .ready
                    .wait_timeout(state, Duration::from_secs_f64(timeout))
                    .expect("wait");
                state = next;
                if result.timed_out() && state.queue.is_empty() {
                    return Ok(Event::bare(EventKind::None));
                }
            }
        }
    }

    fn wakeup(&self, _handle: RawHandle) {
        let mut state = self.state.lock().expect("lock");
        state.calls.push("wakeup".to_string());
        state.queue.push_back(Event::bare(EventKind::None));
        self.ready.notify_all();
    }

    fn set_wakeup_callback(
        &self,
        _handle: RawHandle,
        _callback: sys::mpv_wakeup_cb,
        _ctx: *mut c_void,
    ) {
        self.record("set_wakeup_callback".to_string());
    }

    fn sub_api(&self, _handle: RawHandle, what: SubApi) -> Result<*mut c_void, Error> {
        self.record(format!("sub_api {what:?}"));
        Ok(8 as *mut c_void)
    }
}

fn reason_text(code: ErrorCode) -> String {
    format!("error code {}", code.as_raw())
}

fn node_word(value: &NodeValue) -> String {
    match value {
        NodeValue::String(text) => text.clone(),
        NodeValue::Flag(flag) => flag.to_string(),
        NodeValue::Int64(number) => number.to_string(),
        NodeValue::Double(number) => number.to_string(),
        other => other.to_json().to_string(),
    }
}

/// Handler that records everything it sees, for asserting dispatch order.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    events: Mutex<Vec<Event>>,
    shutdowns: AtomicUsize,
    property_changes: Mutex<Vec<(u64, String, NodeValue)>>,
    end_files: Mutex<Vec<(EndFileReason, Option<ErrorCode>)>>,
    log_lines: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().expect("lock").clone()
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub(crate) fn property_changes(&self) -> Vec<(u64, String, NodeValue)> {
        self.property_changes.lock().expect("lock").clone()
    }

    pub(crate) fn end_files(&self) -> Vec<(EndFileReason, Option<ErrorCode>)> {
        self.end_files.lock().expect("lock").clone()
    }

    pub(crate) fn log_lines(&self) -> Vec<String> {
        self.log_lines.lock().expect("lock").clone()
    }
}

impl EventHandler for RecordingHandler {
    fn on_event(&self, event: &Event) {
        self.events.lock().expect("lock").push(event.clone());
    }

    fn on_shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    fn on_log_message(&self, prefix: &str, level: &str, text: &str) {
        self.log_lines
            .lock()
            .expect("lock")
            .push(format!("[{prefix}] {level}: {text}"));
    }

    fn on_property_change(&self, key: u64, name: &str, value: &NodeValue) {
        self.property_changes
            .lock()
            .expect("lock")
            .push((key, name.to_string(), value.clone()));
    }

    fn on_end_file(&self, reason: EndFileReason, error: Option<ErrorCode>) {
        self.end_files.lock().expect("lock").push((reason, error));
    }
}
