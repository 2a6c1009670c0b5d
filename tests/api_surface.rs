// Public API checks driven through a stub engine; no native library involved.
use std::os::raw::c_void;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mpvbind::api::{
    default_library_name, find_property, to_exit_code, Access, CommandExt, Engine, Error,
    ErrorCode, ErrorKind, Event, EventHandler, EventKind, Format, FromNode, LibMpv, LogLevel,
    NodeValue, PropertyExt, Session, SessionOptions, SubApi, SUPPORTED_API_MAJOR,
};
use mpvbind::core::engine::RawHandle;
use mpvbind::core::libmpv::sys;

/// Canned engine: every call succeeds, every poll reports shutdown.
struct StubEngine;

impl Engine for StubEngine {
    fn api_version(&self) -> u64 {
        (u64::from(SUPPORTED_API_MAJOR) << 16) | 110
    }

    fn error_reason(&self, code: ErrorCode) -> String {
        format!("stub failure {}", code.as_raw())
    }

    fn event_name(&self, kind: EventKind) -> String {
        kind.name().to_string()
    }

    fn create(&self) -> Result<RawHandle, Error> {
        Ok(0x5150usize as RawHandle)
    }

    fn initialize(&self, _handle: RawHandle) -> Result<(), Error> {
        Ok(())
    }

    fn detach_destroy(&self, _handle: RawHandle) {}

    fn terminate_destroy(&self, _handle: RawHandle) {}

    fn set_option(&self, _handle: RawHandle, _name: &str, _value: &NodeValue) -> Result<(), Error> {
        Ok(())
    }

    fn command(&self, _handle: RawHandle, _args: &[String]) -> Result<(), Error> {
        Ok(())
    }

    fn command_node(&self, _handle: RawHandle, _args: &[NodeValue]) -> Result<NodeValue, Error> {
        Ok(NodeValue::None)
    }

    fn get_property(
        &self,
        _handle: RawHandle,
        _name: &str,
        format: Format,
    ) -> Result<NodeValue, Error> {
        Ok(match format {
            Format::Flag => NodeValue::Flag(false),
            Format::Int64 => NodeValue::Int64(3),
            Format::Double => NodeValue::Double(1.0),
            Format::String | Format::OsdString => NodeValue::String("stub title".to_string()),
            _ => NodeValue::None,
        })
    }

    fn set_property(&self, _handle: RawHandle, _name: &str, _value: &NodeValue) -> Result<(), Error> {
        Ok(())
    }

    fn observe_property(
        &self,
        _handle: RawHandle,
        _key: u64,
        _name: &str,
        _format: Format,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn unobserve_property(&self, _handle: RawHandle, _key: u64) -> Result<(), Error> {
        Ok(())
    }

    fn request_event(
        &self,
        _handle: RawHandle,
        _kind: EventKind,
        _enable: bool,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn request_log_messages(&self, _handle: RawHandle, _level: LogLevel) -> Result<(), Error> {
        Ok(())
    }

    fn wait_event(&self, _handle: RawHandle, _timeout: f64) -> Result<Event, Error> {
        Ok(Event::bare(EventKind::Shutdown))
    }

    fn wakeup(&self, _handle: RawHandle) {}

    fn set_wakeup_callback(
        &self,
        _handle: RawHandle,
        _callback: sys::mpv_wakeup_cb,
        _ctx: *mut c_void,
    ) {
    }

    fn sub_api(&self, _handle: RawHandle, _what: SubApi) -> Result<*mut c_void, Error> {
        Err(Error::new(ErrorKind::Native).with_message("the stub has no sub apis"))
    }
}

fn stub_session() -> Session<StubEngine> {
    Session::with_engine(Arc::new(StubEngine), &SessionOptions::default()).expect("session")
}

#[derive(Default)]
struct ShutdownProbe {
    events: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl EventHandler for ShutdownProbe {
    fn on_event(&self, _event: &Event) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }

    fn on_shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn library_names_follow_the_platform() {
    let name = default_library_name();
    if cfg!(target_os = "windows") {
        assert_eq!(name, "mpv-1.dll");
    } else if cfg!(target_os = "macos") {
        assert_eq!(name, "libmpv.dylib");
    } else {
        assert_eq!(name, "libmpv.so.1");
    }
}

#[test]
fn load_failures_carry_the_exit_mapping() {
    let err = LibMpv::load(Some(Path::new("/definitely/not/here/libmpv.so.1")))
        .err()
        .expect("load must fail");
    assert_eq!(err.kind(), ErrorKind::LibraryNotLoaded);
    assert_eq!(to_exit_code(err.kind()), 3);
}

#[test]
fn registry_lookups_expose_format_and_access() {
    let pause = find_property("pause").expect("known");
    assert_eq!(pause.format, Format::Flag);
    assert_eq!(pause.access, Access::ReadWrite);
    assert!(pause.access.allows_read());
    assert!(pause.access.allows_write());

    let duration = find_property("duration").expect("known");
    assert!(!duration.access.allows_write());

    assert!(find_property("no-such-property").is_none());
}

#[test]
fn typed_accessors_work_over_a_custom_engine() {
    let session = stub_session();
    assert_eq!(session.api_version(), (SUPPORTED_API_MAJOR, 110));
    assert!(!session.pause().expect("pause"));
    assert_eq!(session.chapter().expect("chapter"), 3);
    assert_eq!(session.speed().expect("speed"), 1.0);
    assert_eq!(session.media_title().expect("title"), "stub title");
    session.set_speed(1.25).expect("set speed");
    session.play("clip.mkv").expect("play");
}

#[test]
fn observation_keys_are_stable_per_name() {
    let session = stub_session();
    let key = session.observe_property("pause", None, None).expect("observe");
    assert_ne!(key, 0);

    let entries = session.observations();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "pause");
    assert_eq!(entries[0].format, Format::Flag);
    assert_eq!(entries[0].key, key);

    session.unobserve_property(key).expect("unobserve");
    assert!(session.observations().is_empty());
}

#[test]
fn shutdown_polls_end_the_event_loop() {
    let session = stub_session();
    let probe = Arc::new(ShutdownProbe::default());
    session
        .start_events(probe.clone() as Arc<dyn EventHandler>)
        .expect("start");
    session.quit().expect("quit");

    assert!(session.is_closed());
    assert_eq!(probe.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(probe.events.load(Ordering::SeqCst), 1);
    let err = session.pause().expect_err("closed");
    assert_eq!(err.kind(), ErrorKind::Uninitialized);
}

#[test]
fn node_values_round_trip_through_json() {
    let wire = serde_json::json!({
        "count": 2,
        "entries": [{"title": "a"}, {"title": "b"}],
        "playing": true,
        "position": 12.5,
    });
    let value = NodeValue::from_json(&wire).expect("decode");
    assert_eq!(value.to_json(), wire);
}

#[test]
fn typed_conversions_check_their_tags() {
    assert_eq!(f64::from_node(NodeValue::Int64(3)).expect("widen"), 3.0);
    assert!(bool::from_node(NodeValue::Flag(true)).expect("flag"));
    let err = i64::from_node(NodeValue::String("nope".to_string())).expect_err("mismatch");
    assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
}

#[test]
fn log_levels_parse_and_print() {
    assert_eq!(LogLevel::from_str("warn").expect("parse"), LogLevel::Warn);
    assert_eq!(LogLevel::Warn.as_str(), "warn");
    let err = LogLevel::from_str("shouty").expect_err("unknown");
    assert_eq!(err.kind(), ErrorKind::Usage);
}
