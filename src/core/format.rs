//! Purpose: Centralize the wire-level enumerations shared by the client API.
//! Exports: `Format`, `LogLevel`, `EndFileReason`, `SubApi`, version helpers.
//! Role: Shared vocabulary for marshaling, events, and the property registry.
//! Invariants: Numeric values match client.h and never change once published.

use crate::core::error::{Error, ErrorKind};

/// Client API major version this crate is written against.
pub const SUPPORTED_API_MAJOR: u16 = 1;

/// Split a packed `mpv_client_api_version` value into (major, minor).
pub fn split_api_version(packed: u64) -> (u16, u16) {
    (((packed >> 16) & 0xffff) as u16, (packed & 0xffff) as u16)
}

pub fn api_version_error(packed: u64) -> Error {
    let (major, minor) = split_api_version(packed);
    Error::new(ErrorKind::VersionMismatch)
        .with_message(format!(
            "unsupported client API version {major}.{minor} (supported major: {SUPPORTED_API_MAJOR})"
        ))
        .with_hint("Install a libmpv build with client API major version 1.")
}

/// Value format tags understood by the native API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum Format {
    None = 0,
    String = 1,
    OsdString = 2,
    Flag = 3,
    Int64 = 4,
    Double = 5,
    Node = 6,
    NodeArray = 7,
    NodeMap = 8,
    ByteArray = 9,
}

impl Format {
    pub fn from_raw(raw: i32) -> Result<Format, Error> {
        match raw {
            0 => Ok(Format::None),
            1 => Ok(Format::String),
            2 => Ok(Format::OsdString),
            3 => Ok(Format::Flag),
            4 => Ok(Format::Int64),
            5 => Ok(Format::Double),
            6 => Ok(Format::Node),
            7 => Ok(Format::NodeArray),
            8 => Ok(Format::NodeMap),
            9 => Ok(Format::ByteArray),
            other => Err(Error::new(ErrorKind::UnsupportedValue)
                .with_message(format!("unknown format tag {other}"))),
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

/// Log verbosity levels for `request_log_messages`. Numeric values come from
/// `mpv_log_level`; the string names are what the native call accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(i32)]
pub enum LogLevel {
    None = 0,
    Fatal = 10,
    Error = 20,
    Warn = 30,
    Info = 40,
    V = 50,
    Debug = 60,
    Trace = 70,
}

impl LogLevel {
    pub fn from_raw(raw: i32) -> Result<LogLevel, Error> {
        match raw {
            0 => Ok(LogLevel::None),
            10 => Ok(LogLevel::Fatal),
            20 => Ok(LogLevel::Error),
            30 => Ok(LogLevel::Warn),
            40 => Ok(LogLevel::Info),
            50 => Ok(LogLevel::V),
            60 => Ok(LogLevel::Debug),
            70 => Ok(LogLevel::Trace),
            other => Err(Error::new(ErrorKind::UnsupportedValue)
                .with_message(format!("unknown log level {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::None => "no",
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::V => "v",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn from_str(name: &str) -> Result<LogLevel, Error> {
        match name {
            "no" => Ok(LogLevel::None),
            "fatal" => Ok(LogLevel::Fatal),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "v" => Ok(LogLevel::V),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown log level name {other:?}"))
                .with_hint("Use one of: no, fatal, error, warn, info, v, debug, trace.")),
        }
    }
}

/// Why playback of a file ended. Value 1 is unused in the native header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndFileReason {
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown(i32),
}

impl EndFileReason {
    pub fn from_raw(raw: i32) -> EndFileReason {
        match raw {
            0 => EndFileReason::Eof,
            2 => EndFileReason::Stop,
            3 => EndFileReason::Quit,
            4 => EndFileReason::Error,
            5 => EndFileReason::Redirect,
            other => EndFileReason::Unknown(other),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndFileReason::Eof => "eof",
            EndFileReason::Stop => "stop",
            EndFileReason::Quit => "quit",
            EndFileReason::Error => "error",
            EndFileReason::Redirect => "redirect",
            EndFileReason::Unknown(_) => "unknown",
        }
    }
}

/// Sub-API selectors for `get_sub_api`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum SubApi {
    OpenglCb = 1,
}
