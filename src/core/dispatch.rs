//! Purpose: Run the per-session worker that polls and dispatches engine events.
//! Exports: `EventHandler`, `EventLoop`, `LoopExit`, `spawn`.
//! Role: Turns the engine's polled queue into serial typed callbacks.
//! Invariants: Handlers run serially on the worker; nothing is raised into
//! caller code.
//! Invariants: The handle slot is cleared before the completion signal is
//! sent, so whoever receives the signal observes a closed slot.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::core::engine::{Engine, HandleSlot};
use crate::core::error::{Error, ErrorCode, ErrorKind};
use crate::core::events::{Event, EventKind, EventPayload};
use crate::core::format::EndFileReason;
use crate::core::node::NodeValue;

/// Typed callbacks for engine events. Every method defaults to a no-op; the
/// catch-all `on_event` always runs first, then the kind-selected method.
/// Deprecated event kinds reach the catch-all only.
pub trait EventHandler: Send + Sync + 'static {
    fn on_event(&self, _event: &Event) {}
    fn on_shutdown(&self) {}
    fn on_log_message(&self, _prefix: &str, _level: &str, _text: &str) {}
    fn on_get_property_reply(&self, _event: &Event) {}
    fn on_set_property_reply(&self, _event: &Event) {}
    fn on_command_reply(&self, _event: &Event) {}
    fn on_start_file(&self) {}
    fn on_end_file(&self, _reason: EndFileReason, _error: Option<ErrorCode>) {}
    fn on_file_loaded(&self) {}
    fn on_idle(&self) {}
    fn on_tick(&self) {}
    fn on_client_message(&self, _args: &[String]) {}
    fn on_video_reconfig(&self) {}
    fn on_audio_reconfig(&self) {}
    fn on_seek(&self) {}
    fn on_playback_restart(&self) {}
    fn on_property_change(&self, _key: u64, _name: &str, _value: &NodeValue) {}
    fn on_queue_overflow(&self) {}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoopExit {
    /// The engine announced shutdown; the handle was detached in response.
    Shutdown,
    /// The loop stopped without a shutdown announcement.
    Anomaly,
}

/// Join handle plus completion channel for one worker. The completion message
/// is buffered, so receiving it after the thread finished still works.
pub struct EventLoop {
    thread: Option<JoinHandle<()>>,
    done: Receiver<LoopExit>,
}

impl EventLoop {
    /// Block until the worker signals completion, then join it. The signal is
    /// sent strictly after the handle slot is cleared, so the caller can rely
    /// on the slot being closed once this returns.
    pub fn await_exit(&mut self) -> LoopExit {
        let exit = self.done.recv().unwrap_or(LoopExit::Anomaly);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        exit
    }
}

pub fn spawn<E: Engine>(
    engine: Arc<E>,
    slot: Arc<HandleSlot>,
    handler: Arc<dyn EventHandler>,
) -> Result<EventLoop, Error> {
    let (done_tx, done_rx) = mpsc::channel();
    let thread = std::thread::Builder::new()
        .name("mpv-events".to_string())
        .spawn(move || run(engine.as_ref(), &slot, handler.as_ref(), &done_tx))
        .map_err(|err| {
            Error::new(ErrorKind::EventLoop)
                .with_message("could not spawn the event worker")
                .with_source(err)
        })?;
    Ok(EventLoop {
        thread: Some(thread),
        done: done_rx,
    })
}

fn run<E: Engine>(
    engine: &E,
    slot: &HandleSlot,
    handler: &dyn EventHandler,
    done: &Sender<LoopExit>,
) {
    debug!("event worker started");
    let mut guard = ExitGuard {
        engine,
        slot,
        done,
        live: true,
    };
    loop {
        let handle = match slot.get() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("event worker found the handle closed");
                guard.close(LoopExit::Anomaly);
                return;
            }
        };
        let event = match engine.wait_event(handle, -1.0) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "discarding an undecodable event");
                continue;
            }
        };
        match event.kind {
            EventKind::Shutdown => {
                if let Some(handle) = slot.take() {
                    engine.detach_destroy(handle);
                }
                dispatch(handler, &event);
                debug!("event worker exiting after shutdown");
                guard.close(LoopExit::Shutdown);
                return;
            }
            EventKind::None => {
                // An infinite wait only yields the empty event when something
                // is wrong on the engine side.
                warn!("event worker woke with no event");
                dispatch(handler, &event);
                if let Some(handle) = slot.take() {
                    engine.detach_destroy(handle);
                }
                guard.close(LoopExit::Anomaly);
                return;
            }
            _ => dispatch(handler, &event),
        }
    }
}

/// Clears the slot and signals completion if `run` unwinds out of a panicking
/// handler; normal exits go through `close`, which disarms it. Either way the
/// slot is cleared before the signal is sent.
struct ExitGuard<'a, E: Engine> {
    engine: &'a E,
    slot: &'a HandleSlot,
    done: &'a Sender<LoopExit>,
    live: bool,
}

impl<E: Engine> ExitGuard<'_, E> {
    fn close(&mut self, exit: LoopExit) {
        self.live = false;
        let _ = self.done.send(exit);
    }
}

impl<E: Engine> Drop for ExitGuard<'_, E> {
    fn drop(&mut self) {
        if !self.live {
            return;
        }
        warn!("event worker unwound; clearing the handle slot");
        if let Some(handle) = self.slot.take() {
            self.engine.detach_destroy(handle);
        }
        let _ = self.done.send(LoopExit::Anomaly);
    }
}

fn dispatch(handler: &dyn EventHandler, event: &Event) {
    handler.on_event(event);
    match event.kind {
        EventKind::Shutdown => handler.on_shutdown(),
        EventKind::LogMessage => {
            if let Some(EventPayload::LogMessage {
                prefix,
                level,
                text,
            }) = &event.payload
            {
                handler.on_log_message(prefix, level, text);
            }
        }
        EventKind::GetPropertyReply => handler.on_get_property_reply(event),
        EventKind::SetPropertyReply => handler.on_set_property_reply(event),
        EventKind::CommandReply => handler.on_command_reply(event),
        EventKind::StartFile => handler.on_start_file(),
        EventKind::EndFile => {
            if let Some(EventPayload::EndFile { reason, error }) = &event.payload {
                handler.on_end_file(*reason, *error);
            }
        }
        EventKind::FileLoaded => handler.on_file_loaded(),
        EventKind::Idle => handler.on_idle(),
        EventKind::Tick => handler.on_tick(),
        EventKind::ClientMessage => {
            if let Some(EventPayload::ClientMessage(args)) = &event.payload {
                handler.on_client_message(args);
            }
        }
        EventKind::VideoReconfig => handler.on_video_reconfig(),
        EventKind::AudioReconfig => handler.on_audio_reconfig(),
        EventKind::Seek => handler.on_seek(),
        EventKind::PlaybackRestart => handler.on_playback_restart(),
        EventKind::PropertyChange => {
            if let Some(EventPayload::PropertyChange { name, value }) = &event.payload {
                handler.on_property_change(event.reply_key, name, value);
            }
        }
        EventKind::QueueOverflow => handler.on_queue_overflow(),
        EventKind::None
        | EventKind::TracksChanged
        | EventKind::TrackSwitched
        | EventKind::Pause
        | EventKind::Unpause
        | EventKind::ScriptInputDispatch
        | EventKind::MetadataUpdate
        | EventKind::ChapterChange
        | EventKind::Unknown(_) => {}
    }
}
