//! Purpose: Load the native library, bind its symbols, and wrap every call.
//! Exports: `LibMpv`, `default_library_name`.
//! Role: The only module that touches raw symbols; everything else calls
//! through the `Engine` trait this module implements.
//! Invariants: Symbols are resolved once at load; negative return codes are
//! translated with call name, reason text, and stringified args.
//! Invariants: Engine-owned memory is copied out and freed exactly once.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use libloading::Library;
use tracing::debug;

use crate::core::engine::{Engine, RawHandle};
use crate::core::error::{Error, ErrorCode, ErrorKind};
use crate::core::events::{self, Event, EventKind};
use crate::core::format::{self, Format, LogLevel, SubApi};
use crate::core::node::{self, NodeBuilder, NodeValue};

pub mod sys;

/// Platform default the dynamic loader resolves when no explicit path is
/// given. These are the soname-style names the engine ships under.
pub fn default_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "mpv-1.dll"
    } else if cfg!(target_os = "macos") {
        "libmpv.dylib"
    } else {
        "libmpv.so.1"
    }
}

/// A loaded engine library with its bound call table. Construct with
/// [`LibMpv::load`]; clone the `Arc` to share between a session and its event
/// loop.
pub struct LibMpv {
    api: sys::Api,
    _library: Library,
}

impl LibMpv {
    /// Open the library (explicit path or platform default), bind the full
    /// symbol table, and gate on the client API major version. The numeric
    /// locale is pinned to `C` first; the engine refuses to run without it.
    pub fn load(path: Option<&Path>) -> Result<Arc<LibMpv>, Error> {
        pin_numeric_locale();

        let name = match path {
            Some(path) => path.as_os_str().to_os_string(),
            None => default_library_name().into(),
        };
        let library = unsafe { Library::new(&name) }.map_err(|err| {
            Error::new(ErrorKind::LibraryNotLoaded)
                .with_message(format!("could not load {}", name.to_string_lossy()))
                .with_hint("Install libmpv or pass an explicit library path.")
                .with_source(err)
        })?;

        let api = bind(&library)?;

        let packed = u64::from(unsafe { (api.client_api_version)() });
        let (major, minor) = format::split_api_version(packed);
        if major != format::SUPPORTED_API_MAJOR {
            return Err(format::api_version_error(packed));
        }
        debug!(major, minor, "loaded client api");

        Ok(Arc::new(LibMpv { api, _library: library }))
    }

    fn reason(&self, code: ErrorCode) -> String {
        let ptr = unsafe { (self.api.error_string)(code.as_raw()) };
        if ptr.is_null() {
            return format!("error {}", code.as_raw());
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    fn check(&self, function: &'static str, args: Vec<String>, status: c_int) -> Result<(), Error> {
        let code = ErrorCode::from_raw(status);
        if code == ErrorCode::Success {
            return Ok(());
        }
        Err(Error::native(function, code, self.reason(code), args))
    }
}

impl Engine for LibMpv {
    fn api_version(&self) -> u64 {
        u64::from(unsafe { (self.api.client_api_version)() })
    }

    fn error_reason(&self, code: ErrorCode) -> String {
        self.reason(code)
    }

    fn event_name(&self, kind: EventKind) -> String {
        let ptr = unsafe { (self.api.event_name)(kind.as_raw()) };
        if ptr.is_null() {
            return kind.name().to_string();
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    fn create(&self) -> Result<RawHandle, Error> {
        let handle = unsafe { (self.api.create)() };
        if handle.is_null() {
            return Err(Error::new(ErrorKind::Native)
                .with_function("mpv_create")
                .with_message("returned a null handle"));
        }
        Ok(handle)
    }

    fn initialize(&self, handle: RawHandle) -> Result<(), Error> {
        let status = unsafe { (self.api.initialize)(handle) };
        self.check("mpv_initialize", Vec::new(), status)
    }

    fn detach_destroy(&self, handle: RawHandle) {
        unsafe { (self.api.detach_destroy)(handle) };
    }

    fn terminate_destroy(&self, handle: RawHandle) {
        unsafe { (self.api.terminate_destroy)(handle) };
    }

    fn set_option(&self, handle: RawHandle, name: &str, value: &NodeValue) -> Result<(), Error> {
        let c_name = c_string(name)?;
        let mut builder = NodeBuilder::from_value(value)?;
        let status = unsafe {
            (self.api.set_option)(
                handle,
                c_name.as_ptr(),
                Format::Node.as_raw(),
                builder.node() as *mut c_void,
            )
        };
        self.check(
            "mpv_set_option",
            vec![name.to_string(), stringify(value)],
            status,
        )
    }

    fn command(&self, handle: RawHandle, args: &[String]) -> Result<(), Error> {
        let storage = args
            .iter()
            .map(|arg| c_string(arg))
            .collect::<Result<Vec<_>, Error>>()?;
        let mut argv: Vec<*const c_char> = storage.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(ptr::null());
        let status = unsafe { (self.api.command)(handle, argv.as_mut_ptr()) };
        self.check("mpv_command", args.to_vec(), status)
    }

    fn command_node(&self, handle: RawHandle, args: &[NodeValue]) -> Result<NodeValue, Error> {
        let mut builder = NodeBuilder::from_value(&NodeValue::Array(args.to_vec()))?;
        let mut reply = sys::mpv_node {
            u: sys::mpv_node_u { int64: 0 },
            format: Format::None.as_raw(),
        };
        let status =
            unsafe { (self.api.command_node)(handle, builder.node(), &mut reply) };
        self.check(
            "mpv_command_node",
            args.iter().map(stringify).collect(),
            status,
        )?;
        let decoded = unsafe { node::decode(&reply) };
        unsafe { (self.api.free_node_contents)(&mut reply) };
        decoded
    }

    fn get_property(
        &self,
        handle: RawHandle,
        name: &str,
        format: Format,
    ) -> Result<NodeValue, Error> {
        let c_name = c_string(name)?;
        let args = vec![name.to_string(), format!("{format:?}")];
        match format {
            Format::Node => {
                let mut out = sys::mpv_node {
                    u: sys::mpv_node_u { int64: 0 },
                    format: Format::None.as_raw(),
                };
                let status = unsafe {
                    (self.api.get_property)(
                        handle,
                        c_name.as_ptr(),
                        format.as_raw(),
                        &mut out as *mut _ as *mut c_void,
                    )
                };
                self.check("mpv_get_property", args, status)?;
                let decoded = unsafe { node::decode(&out) };
                unsafe { (self.api.free_node_contents)(&mut out) };
                decoded
            }
            Format::String | Format::OsdString => {
                let mut out: *mut c_char = ptr::null_mut();
                let status = unsafe {
                    (self.api.get_property)(
                        handle,
                        c_name.as_ptr(),
                        format.as_raw(),
                        &mut out as *mut _ as *mut c_void,
                    )
                };
                self.check("mpv_get_property", args, status)?;
                if out.is_null() {
                    return Err(Error::new(ErrorKind::Internal)
                        .with_message("property get returned a null string"));
                }
                let text = unsafe { CStr::from_ptr(out) }.to_string_lossy().into_owned();
                unsafe { (self.api.free)(out as *mut c_void) };
                Ok(NodeValue::String(text))
            }
            Format::Flag => {
                let mut out: c_int = 0;
                let status = unsafe {
                    (self.api.get_property)(
                        handle,
                        c_name.as_ptr(),
                        format.as_raw(),
                        &mut out as *mut _ as *mut c_void,
                    )
                };
                self.check("mpv_get_property", args, status)?;
                Ok(NodeValue::Flag(out != 0))
            }
            Format::Int64 => {
                let mut out: i64 = 0;
                let status = unsafe {
                    (self.api.get_property)(
                        handle,
                        c_name.as_ptr(),
                        format.as_raw(),
                        &mut out as *mut _ as *mut c_void,
                    )
                };
                self.check("mpv_get_property", args, status)?;
                Ok(NodeValue::Int64(out))
            }
            Format::Double => {
                let mut out: f64 = 0.0;
                let status = unsafe {
                    (self.api.get_property)(
                        handle,
                        c_name.as_ptr(),
                        format.as_raw(),
                        &mut out as *mut _ as *mut c_void,
                    )
                };
                self.check("mpv_get_property", args, status)?;
                Ok(NodeValue::Double(out))
            }
            Format::None | Format::NodeArray | Format::NodeMap | Format::ByteArray => {
                Err(Error::new(ErrorKind::UnsupportedValue).with_message(format!(
                    "format tag {} is not valid for a property get",
                    format.as_raw()
                )))
            }
        }
    }

    fn set_property(&self, handle: RawHandle, name: &str, value: &NodeValue) -> Result<(), Error> {
        let c_name = c_string(name)?;
        let mut builder = NodeBuilder::from_value(value)?;
        let status = unsafe {
            (self.api.set_property)(
                handle,
                c_name.as_ptr(),
                Format::Node.as_raw(),
                builder.node() as *mut c_void,
            )
        };
        self.check(
            "mpv_set_property",
            vec![name.to_string(), stringify(value)],
            status,
        )
    }

    fn observe_property(
        &self,
        handle: RawHandle,
        key: u64,
        name: &str,
        format: Format,
    ) -> Result<(), Error> {
        let c_name = c_string(name)?;
        let status = unsafe {
            (self.api.observe_property)(handle, key, c_name.as_ptr(), format.as_raw())
        };
        self.check(
            "mpv_observe_property",
            vec![key.to_string(), name.to_string(), format!("{format:?}")],
            status,
        )
    }

    fn unobserve_property(&self, handle: RawHandle, key: u64) -> Result<(), Error> {
        let status = unsafe { (self.api.unobserve_property)(handle, key) };
        self.check("mpv_unobserve_property", vec![key.to_string()], status)
    }

    fn request_event(&self, handle: RawHandle, kind: EventKind, enable: bool) -> Result<(), Error> {
        let status = unsafe {
            (self.api.request_event)(handle, kind.as_raw(), if enable { 1 } else { 0 })
        };
        self.check(
            "mpv_request_event",
            vec![kind.name().to_string(), enable.to_string()],
            status,
        )
    }

    fn request_log_messages(&self, handle: RawHandle, level: LogLevel) -> Result<(), Error> {
        let c_level = c_string(level.as_str())?;
        let status = unsafe { (self.api.request_log_messages)(handle, c_level.as_ptr()) };
        self.check(
            "mpv_request_log_messages",
            vec![level.as_str().to_string()],
            status,
        )
    }

    fn wait_event(&self, handle: RawHandle, timeout: f64) -> Result<Event, Error> {
        let record = unsafe { (self.api.wait_event)(handle, timeout) };
        if record.is_null() {
            return Err(Error::new(ErrorKind::Internal)
                .with_function("mpv_wait_event")
                .with_message("returned a null event record"));
        }
        unsafe { events::decode_event(record) }
    }

    fn wakeup(&self, handle: RawHandle) {
        unsafe { (self.api.wakeup)(handle) };
    }

    fn set_wakeup_callback(
        &self,
        handle: RawHandle,
        callback: sys::mpv_wakeup_cb,
        ctx: *mut c_void,
    ) {
        unsafe { (self.api.set_wakeup_callback)(handle, callback, ctx) };
    }

    fn sub_api(&self, handle: RawHandle, what: SubApi) -> Result<*mut c_void, Error> {
        let ptr = unsafe { (self.api.get_sub_api)(handle, what as c_int) };
        if ptr.is_null() {
            return Err(Error::new(ErrorKind::Native)
                .with_function("mpv_get_sub_api")
                .with_message(format!("sub-api {what:?} is unavailable")));
        }
        Ok(ptr)
    }
}

fn bind(library: &Library) -> Result<sys::Api, Error> {
    Ok(sys::Api {
        client_api_version: symbol(library, b"mpv_client_api_version\0")?,
        error_string: symbol(library, b"mpv_error_string\0")?,
        event_name: symbol(library, b"mpv_event_name\0")?,
        free: symbol(library, b"mpv_free\0")?,
        free_node_contents: symbol(library, b"mpv_free_node_contents\0")?,
        create: symbol(library, b"mpv_create\0")?,
        initialize: symbol(library, b"mpv_initialize\0")?,
        detach_destroy: symbol(library, b"mpv_detach_destroy\0")?,
        terminate_destroy: symbol(library, b"mpv_terminate_destroy\0")?,
        set_option: symbol(library, b"mpv_set_option\0")?,
        command: symbol(library, b"mpv_command\0")?,
        command_node: symbol(library, b"mpv_command_node\0")?,
        get_property: symbol(library, b"mpv_get_property\0")?,
        set_property: symbol(library, b"mpv_set_property\0")?,
        observe_property: symbol(library, b"mpv_observe_property\0")?,
        unobserve_property: symbol(library, b"mpv_unobserve_property\0")?,
        request_event: symbol(library, b"mpv_request_event\0")?,
        request_log_messages: symbol(library, b"mpv_request_log_messages\0")?,
        wait_event: symbol(library, b"mpv_wait_event\0")?,
        wakeup: symbol(library, b"mpv_wakeup\0")?,
        set_wakeup_callback: symbol(library, b"mpv_set_wakeup_callback\0")?,
        get_sub_api: symbol(library, b"mpv_get_sub_api\0")?,
    })
}

/// Resolve one symbol and copy its raw pointer out of the borrow. The pointer
/// stays valid for as long as the `Library` that produced it is loaded, which
/// `LibMpv` guarantees by owning both.
fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T, Error> {
    let printable = String::from_utf8_lossy(&name[..name.len().saturating_sub(1)]).into_owned();
    let symbol = unsafe { library.get::<T>(name) }.map_err(|err| {
        Error::new(ErrorKind::LibraryNotLoaded)
            .with_message(format!("missing symbol {printable}"))
            .with_hint("The library loaded but lacks this entry point; check the build.")
            .with_source(err)
    })?;
    Ok(*symbol)
}

fn c_string(text: &str) -> Result<CString, Error> {
    CString::new(text).map_err(|err| {
        Error::new(ErrorKind::UnsupportedValue)
            .with_message("string contains an interior null byte")
            .with_source(err)
    })
}

fn stringify(value: &NodeValue) -> String {
    value.to_json().to_string()
}

/// libmpv refuses to initialize unless `LC_NUMERIC` is `C`.
#[cfg(unix)]
fn pin_numeric_locale() {
    unsafe {
        libc::setlocale(libc::LC_NUMERIC, c"C".as_ptr());
    }
}

#[cfg(not(unix))]
fn pin_numeric_locale() {
    unsafe {
        std::env::set_var("LC_NUMERIC", "C");
    }
}

#[cfg(test)]
mod tests {
    use super::{default_library_name, LibMpv};
    use crate::core::error::ErrorKind;
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn default_name_matches_platform() {
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
    fn missing_library_fails_load() {
        let err = LibMpv::load(Some(Path::new("/definitely/not/here/libmpv.so.1")))
            .err()
            .expect("load must fail");
        assert_eq!(err.kind(), ErrorKind::LibraryNotLoaded);
        assert!(err.to_string().contains("not/here"));
    }

    #[test]
    fn non_library_file_fails_load() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"this is not a shared object")
            .expect("write");
        let err = LibMpv::load(Some(file.path())).err().expect("load must fail");
        assert_eq!(err.kind(), ErrorKind::LibraryNotLoaded);
    }
}
