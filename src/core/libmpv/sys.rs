// Raw type layouts and call signatures for the libmpv client API.
#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_ulong, c_void};

/// Opaque client handle. Only ever used behind a raw pointer.
#[repr(C)]
pub struct mpv_handle {
    _unused: [u8; 0],
}

/// Untagged payload of `mpv_node`; `mpv_node.format` selects the live field.
#[repr(C)]
#[derive(Clone, Copy)]
pub union mpv_node_u {
    pub string: *mut c_char,
    pub flag: c_int,
    pub int64: i64,
    pub double_: f64,
    pub list: *mut mpv_node_list,
    pub ba: *mut mpv_byte_array,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct mpv_node {
    pub u: mpv_node_u,
    pub format: c_int,
}

/// Backing storage for array and map nodes. For maps, `keys[i]` names
/// `values[i]`; for arrays, `keys` is null.
#[repr(C)]
pub struct mpv_node_list {
    pub num: c_int,
    pub values: *mut mpv_node,
    pub keys: *mut *mut c_char,
}

#[repr(C)]
pub struct mpv_byte_array {
    pub data: *mut c_void,
    pub size: usize,
}

#[repr(C)]
pub struct mpv_event {
    pub event_id: c_int,
    pub error: c_int,
    pub reply_userdata: u64,
    pub data: *mut c_void,
}

#[repr(C)]
pub struct mpv_event_property {
    pub name: *mut c_char,
    pub format: c_int,
    pub data: *mut c_void,
}

#[repr(C)]
pub struct mpv_event_log_message {
    pub prefix: *mut c_char,
    pub level: *mut c_char,
    pub text: *mut c_char,
    pub log_level: c_int,
}

#[repr(C)]
pub struct mpv_event_end_file {
    pub reason: c_int,
    pub error: c_int,
}

#[repr(C)]
pub struct mpv_event_client_message {
    pub num_args: c_int,
    pub args: *mut *mut c_char,
}

pub type mpv_wakeup_cb = Option<unsafe extern "C" fn(*mut c_void)>;

pub type mpv_client_api_version_fn = unsafe extern "C" fn() -> c_ulong;
pub type mpv_error_string_fn = unsafe extern "C" fn(c_int) -> *const c_char;
pub type mpv_event_name_fn = unsafe extern "C" fn(c_int) -> *const c_char;
pub type mpv_free_fn = unsafe extern "C" fn(*mut c_void);
pub type mpv_free_node_contents_fn = unsafe extern "C" fn(*mut mpv_node);
pub type mpv_create_fn = unsafe extern "C" fn() -> *mut mpv_handle;
pub type mpv_initialize_fn = unsafe extern "C" fn(*mut mpv_handle) -> c_int;
pub type mpv_detach_destroy_fn = unsafe extern "C" fn(*mut mpv_handle);
pub type mpv_terminate_destroy_fn = unsafe extern "C" fn(*mut mpv_handle);
pub type mpv_set_option_fn =
    unsafe extern "C" fn(*mut mpv_handle, *const c_char, c_int, *mut c_void) -> c_int;
pub type mpv_command_fn = unsafe extern "C" fn(*mut mpv_handle, *mut *const c_char) -> c_int;
pub type mpv_command_node_fn =
    unsafe extern "C" fn(*mut mpv_handle, *mut mpv_node, *mut mpv_node) -> c_int;
pub type mpv_get_property_fn =
    unsafe extern "C" fn(*mut mpv_handle, *const c_char, c_int, *mut c_void) -> c_int;
pub type mpv_set_property_fn =
    unsafe extern "C" fn(*mut mpv_handle, *const c_char, c_int, *mut c_void) -> c_int;
pub type mpv_observe_property_fn =
    unsafe extern "C" fn(*mut mpv_handle, u64, *const c_char, c_int) -> c_int;
pub type mpv_unobserve_property_fn = unsafe extern "C" fn(*mut mpv_handle, u64) -> c_int;
pub type mpv_request_event_fn = unsafe extern "C" fn(*mut mpv_handle, c_int, c_int) -> c_int;
pub type mpv_request_log_messages_fn =
    unsafe extern "C" fn(*mut mpv_handle, *const c_char) -> c_int;
pub type mpv_wait_event_fn = unsafe extern "C" fn(*mut mpv_handle, f64) -> *mut mpv_event;
pub type mpv_wakeup_fn = unsafe extern "C" fn(*mut mpv_handle);
pub type mpv_set_wakeup_callback_fn =
    unsafe extern "C" fn(*mut mpv_handle, mpv_wakeup_cb, *mut c_void);
pub type mpv_get_sub_api_fn = unsafe extern "C" fn(*mut mpv_handle, c_int) -> *mut c_void;

/// The full bound surface, resolved once at load time. No symbol is looked up
/// anywhere else.
pub struct Api {
    pub client_api_version: mpv_client_api_version_fn,
    pub error_string: mpv_error_string_fn,
    pub event_name: mpv_event_name_fn,
    pub free: mpv_free_fn,
    pub free_node_contents: mpv_free_node_contents_fn,
    pub create: mpv_create_fn,
    pub initialize: mpv_initialize_fn,
    pub detach_destroy: mpv_detach_destroy_fn,
    pub terminate_destroy: mpv_terminate_destroy_fn,
    pub set_option: mpv_set_option_fn,
    pub command: mpv_command_fn,
    pub command_node: mpv_command_node_fn,
    pub get_property: mpv_get_property_fn,
    pub set_property: mpv_set_property_fn,
    pub observe_property: mpv_observe_property_fn,
    pub unobserve_property: mpv_unobserve_property_fn,
    pub request_event: mpv_request_event_fn,
    pub request_log_messages: mpv_request_log_messages_fn,
    pub wait_event: mpv_wait_event_fn,
    pub wakeup: mpv_wakeup_fn,
    pub set_wakeup_callback: mpv_set_wakeup_callback_fn,
    pub get_sub_api: mpv_get_sub_api_fn,
}
