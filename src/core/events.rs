// Typed view of the engine's polled event records.
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::core::error::{Error, ErrorCode, ErrorKind};
use crate::core::format::{EndFileReason, Format};
use crate::core::libmpv::sys;
use crate::core::node::{self, NodeValue};

/// Every event id the client API defines, including the deprecated ones the
/// engine may still emit. Ids this build does not know survive as `Unknown`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    None,
    Shutdown,
    LogMessage,
    GetPropertyReply,
    SetPropertyReply,
    CommandReply,
    StartFile,
    EndFile,
    FileLoaded,
    TracksChanged,
    TrackSwitched,
    Idle,
    Pause,
    Unpause,
    Tick,
    ScriptInputDispatch,
    ClientMessage,
    VideoReconfig,
    AudioReconfig,
    MetadataUpdate,
    Seek,
    PlaybackRestart,
    PropertyChange,
    ChapterChange,
    QueueOverflow,
    Unknown(i32),
}

impl EventKind {
    pub fn from_raw(raw: i32) -> EventKind {
        match raw {
            0 => EventKind::None,
            1 => EventKind::Shutdown,
            2 => EventKind::LogMessage,
            3 => EventKind::GetPropertyReply,
            4 => EventKind::SetPropertyReply,
            5 => EventKind::CommandReply,
            6 => EventKind::StartFile,
            7 => EventKind::EndFile,
            8 => EventKind::FileLoaded,
            9 => EventKind::TracksChanged,
            10 => EventKind::TrackSwitched,
            11 => EventKind::Idle,
            12 => EventKind::Pause,
            13 => EventKind::Unpause,
            14 => EventKind::Tick,
            15 => EventKind::ScriptInputDispatch,
            16 => EventKind::ClientMessage,
            17 => EventKind::VideoReconfig,
            18 => EventKind::AudioReconfig,
            19 => EventKind::MetadataUpdate,
            20 => EventKind::Seek,
            21 => EventKind::PlaybackRestart,
            22 => EventKind::PropertyChange,
            23 => EventKind::ChapterChange,
            24 => EventKind::QueueOverflow,
            other => EventKind::Unknown(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            EventKind::None => 0,
            EventKind::Shutdown => 1,
            EventKind::LogMessage => 2,
            EventKind::GetPropertyReply => 3,
            EventKind::SetPropertyReply => 4,
            EventKind::CommandReply => 5,
            EventKind::StartFile => 6,
            EventKind::EndFile => 7,
            EventKind::FileLoaded => 8,
            EventKind::TracksChanged => 9,
            EventKind::TrackSwitched => 10,
            EventKind::Idle => 11,
            EventKind::Pause => 12,
            EventKind::Unpause => 13,
            EventKind::Tick => 14,
            EventKind::ScriptInputDispatch => 15,
            EventKind::ClientMessage => 16,
            EventKind::VideoReconfig => 17,
            EventKind::AudioReconfig => 18,
            EventKind::MetadataUpdate => 19,
            EventKind::Seek => 20,
            EventKind::PlaybackRestart => 21,
            EventKind::PropertyChange => 22,
            EventKind::ChapterChange => 23,
            EventKind::QueueOverflow => 24,
            EventKind::Unknown(raw) => raw,
        }
    }

    /// Canonical event names as reported by `mpv_event_name`.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::None => "none",
            EventKind::Shutdown => "shutdown",
            EventKind::LogMessage => "log-message",
            EventKind::GetPropertyReply => "get-property-reply",
            EventKind::SetPropertyReply => "set-property-reply",
            EventKind::CommandReply => "command-reply",
            EventKind::StartFile => "start-file",
            EventKind::EndFile => "end-file",
            EventKind::FileLoaded => "file-loaded",
            EventKind::TracksChanged => "tracks-changed",
            EventKind::TrackSwitched => "track-switched",
            EventKind::Idle => "idle",
            EventKind::Pause => "pause",
            EventKind::Unpause => "unpause",
            EventKind::Tick => "tick",
            EventKind::ScriptInputDispatch => "script-input-dispatch",
            EventKind::ClientMessage => "client-message",
            EventKind::VideoReconfig => "video-reconfig",
            EventKind::AudioReconfig => "audio-reconfig",
            EventKind::MetadataUpdate => "metadata-update",
            EventKind::Seek => "seek",
            EventKind::PlaybackRestart => "playback-restart",
            EventKind::PropertyChange => "property-change",
            EventKind::ChapterChange => "chapter-change",
            EventKind::QueueOverflow => "event-queue-overflow",
            EventKind::Unknown(_) => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    LogMessage {
        prefix: String,
        level: String,
        text: String,
    },
    PropertyChange {
        name: String,
        value: NodeValue,
    },
    EndFile {
        reason: EndFileReason,
        error: Option<ErrorCode>,
    },
    ClientMessage(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub error: Option<ErrorCode>,
    pub reply_key: u64,
    pub payload: Option<EventPayload>,
}

impl Event {
    pub fn bare(kind: EventKind) -> Event {
        Event {
            kind,
            error: None,
            reply_key: 0,
            payload: None,
        }
    }
}

/// Decode one raw event record. Everything is copied out; the record stays
/// owned by the engine and is reclaimed by its next `wait_event`.
///
/// # Safety
/// `raw` must point to a readable `mpv_event` whose payload pointer (if any)
/// matches its event id, both valid for the duration of the call.
pub unsafe fn decode_event(raw: *const sys::mpv_event) -> Result<Event, Error> {
    let Some(record) = (unsafe { raw.as_ref() }) else {
        return Err(Error::new(ErrorKind::Internal).with_message("null event record"));
    };
    let kind = EventKind::from_raw(record.event_id);
    let error = if record.error < 0 {
        Some(ErrorCode::from_raw(record.error))
    } else {
        None
    };

    // Reply events with a failed status carry no usable payload.
    let payload = if error.is_some() {
        None
    } else {
        match kind {
            EventKind::LogMessage => unsafe { decode_log_message(record.data.cast()) }?,
            EventKind::PropertyChange | EventKind::GetPropertyReply => {
                unsafe { decode_property(record.data.cast()) }?
            }
            EventKind::EndFile => unsafe { decode_end_file(record.data.cast()) },
            EventKind::ClientMessage => unsafe { decode_client_message(record.data.cast()) }?,
            _ => None,
        }
    };

    Ok(Event {
        kind,
        error,
        reply_key: record.reply_userdata,
        payload,
    })
}

unsafe fn decode_log_message(
    data: *const sys::mpv_event_log_message,
) -> Result<Option<EventPayload>, Error> {
    let Some(message) = (unsafe { data.as_ref() }) else {
        return Ok(None);
    };
    Ok(Some(EventPayload::LogMessage {
        prefix: unsafe { copy_string(message.prefix) }?,
        level: unsafe { copy_string(message.level) }?,
        text: unsafe { copy_string(message.text) }?,
    }))
}

unsafe fn decode_property(
    data: *const sys::mpv_event_property,
) -> Result<Option<EventPayload>, Error> {
    let Some(property) = (unsafe { data.as_ref() }) else {
        return Ok(None);
    };
    let name = unsafe { copy_string(property.name) }?;
    let format = Format::from_raw(property.format)?;
    let value = unsafe { decode_property_value(format, property.data) }?;
    Ok(Some(EventPayload::PropertyChange { name, value }))
}

/// The data pointer is laid out exactly like the out-pointer of a typed
/// property get: one more indirection for strings, direct for scalars.
unsafe fn decode_property_value(
    format: Format,
    data: *const std::os::raw::c_void,
) -> Result<NodeValue, Error> {
    if format == Format::None {
        return Ok(NodeValue::None);
    }
    if data.is_null() {
        return Err(Error::new(ErrorKind::Internal)
            .with_message(format!("property event with format {format:?} has no data")));
    }
    match format {
        Format::None => Ok(NodeValue::None),
        Format::String | Format::OsdString => {
            let text = unsafe { copy_string(*(data as *const *const c_char)) }?;
            Ok(NodeValue::String(text))
        }
        Format::Flag => Ok(NodeValue::Flag(unsafe { *(data as *const c_int) } != 0)),
        Format::Int64 => Ok(NodeValue::Int64(unsafe { *(data as *const i64) })),
        Format::Double => Ok(NodeValue::Double(unsafe { *(data as *const f64) })),
        Format::Node => unsafe { node::decode(data as *const sys::mpv_node) },
        Format::NodeArray | Format::NodeMap | Format::ByteArray => {
            Err(Error::new(ErrorKind::UnsupportedValue).with_message(format!(
                "format tag {} is not valid for a property event",
                format.as_raw()
            )))
        }
    }
}

unsafe fn decode_end_file(data: *const sys::mpv_event_end_file) -> Option<EventPayload> {
    let record = unsafe { data.as_ref() }?;
    let reason = EndFileReason::from_raw(record.reason);
    let error = if reason == EndFileReason::Error {
        Some(ErrorCode::from_raw(record.error))
    } else {
        None
    };
    Some(EventPayload::EndFile { reason, error })
}

unsafe fn decode_client_message(
    data: *const sys::mpv_event_client_message,
) -> Result<Option<EventPayload>, Error> {
    let Some(message) = (unsafe { data.as_ref() }) else {
        return Ok(None);
    };
    if message.num_args < 0 {
        return Err(Error::new(ErrorKind::Internal)
            .with_message(format!("client message with {} args", message.num_args)));
    }
    let count = message.num_args as usize;
    if count > 0 && message.args.is_null() {
        return Err(Error::new(ErrorKind::Internal).with_message("client message has null args"));
    }
    let mut args = Vec::with_capacity(count);
    for index in 0..count {
        let arg = unsafe { *message.args.add(index) };
        args.push(unsafe { copy_string(arg) }?);
    }
    Ok(Some(EventPayload::ClientMessage(args)))
}

unsafe fn copy_string(ptr: *const c_char) -> Result<String, Error> {
    if ptr.is_null() {
        return Err(Error::new(ErrorKind::Internal).with_message("null string in event record"));
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}
