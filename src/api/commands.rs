//! Purpose: Name the common engine commands as typed shortcuts.
//! Exports: `CommandExt`, `LoadMode`, `SeekMode`, `SeekPrecision`,
//! `ScreenshotMode`.
//! Role: Convenience layer over `Session::command` and
//! `Session::command_node`; no new semantics.

use crate::core::engine::Engine;
use crate::core::error::Error;
use crate::core::node::NodeValue;
use crate::core::session::Session;

/// Playlist behavior for `loadfile` and `loadlist`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Stop playback and start the new entry immediately.
    Replace,
    /// Append to the playlist without touching playback.
    Append,
    /// Append, and start playing it when nothing else is playing.
    AppendPlay,
}

impl LoadMode {
    fn as_str(self) -> &'static str {
        match self {
            LoadMode::Replace => "replace",
            LoadMode::Append => "append",
            LoadMode::AppendPlay => "append-play",
        }
    }
}

/// How a `seek` target is interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeekMode {
    /// Seconds relative to the current position.
    Relative,
    /// Absolute position in seconds.
    Absolute,
    /// Percentage relative to the current position.
    RelativePercent,
    /// Absolute percentage of the file.
    AbsolutePercent,
}

impl SeekMode {
    fn as_str(self) -> &'static str {
        match self {
            SeekMode::Relative => "relative",
            SeekMode::Absolute => "absolute",
            SeekMode::RelativePercent => "relative-percent",
            SeekMode::AbsolutePercent => "absolute-percent",
        }
    }
}

/// How exactly a `seek` lands on its target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeekPrecision {
    /// Let the player choose; normally a fast keyframe seek.
    DefaultPrecise,
    /// Snap to the nearest keyframe, fast but coarse.
    Keyframes,
    /// Decode up to the exact target position.
    Exact,
}

impl SeekPrecision {
    fn as_str(self) -> &'static str {
        match self {
            SeekPrecision::DefaultPrecise => "default-precise",
            SeekPrecision::Keyframes => "keyframes",
            SeekPrecision::Exact => "exact",
        }
    }
}

/// What a screenshot captures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScreenshotMode {
    /// The video frame with subtitles and OSD rendered in.
    Subtitles,
    /// The plain video frame.
    Video,
    /// The window contents as displayed.
    Window,
}

impl ScreenshotMode {
    fn as_str(self) -> &'static str {
        match self {
            ScreenshotMode::Subtitles => "subtitles",
            ScreenshotMode::Video => "video",
            ScreenshotMode::Window => "window",
        }
    }
}

/// Shortcuts for the commands a host reaches for first. Each one issues the
/// matching engine command; anything not covered here goes through
/// [`Session::command`] or [`Session::command_node`] directly.
pub trait CommandExt {
    fn load_file(&self, path: &str, mode: LoadMode) -> Result<(), Error>;
    fn load_list(&self, path: &str, mode: LoadMode) -> Result<(), Error>;
    /// Replace the playlist with `path` and start playing it.
    fn play(&self, path: &str) -> Result<(), Error>;
    /// Stop playback and clear the playlist.
    fn stop(&self) -> Result<(), Error>;
    /// Seek to `target`. Runs as a node command so the amount stays a double
    /// on the wire.
    fn seek(&self, target: f64, mode: SeekMode, precision: SeekPrecision) -> Result<(), Error>;
    /// Undo the last `seek` back to the position before it.
    fn revert_seek(&self) -> Result<(), Error>;
    fn frame_step(&self) -> Result<(), Error>;
    fn frame_back_step(&self) -> Result<(), Error>;
    /// Add `amount` to a numeric property.
    fn add(&self, property: &str, amount: f64) -> Result<(), Error>;
    /// Cycle a property through its value range.
    fn cycle(&self, property: &str) -> Result<(), Error>;
    /// Multiply a numeric property by `factor`.
    fn multiply(&self, property: &str, factor: f64) -> Result<(), Error>;
    fn screenshot(&self, mode: ScreenshotMode) -> Result<(), Error>;
    fn screenshot_to_file(&self, path: &str, mode: ScreenshotMode) -> Result<(), Error>;
    fn playlist_next(&self) -> Result<(), Error>;
    fn playlist_prev(&self) -> Result<(), Error>;
    fn playlist_clear(&self) -> Result<(), Error>;
    /// Remove the entry at `index`, or the current one when `None`.
    fn playlist_remove(&self, index: Option<i64>) -> Result<(), Error>;
    fn playlist_move(&self, from: i64, to: i64) -> Result<(), Error>;
    fn playlist_shuffle(&self) -> Result<(), Error>;
    fn sub_add(&self, path: &str) -> Result<(), Error>;
    /// Remove the subtitle track `id`, or the current one when `None`.
    fn sub_remove(&self, id: Option<i64>) -> Result<(), Error>;
    fn sub_reload(&self, id: Option<i64>) -> Result<(), Error>;
    /// Step through subtitles by `skip` events, changing subtitle timing.
    fn sub_step(&self, skip: i64) -> Result<(), Error>;
    /// Seek to the subtitle `skip` events away.
    fn sub_seek(&self, skip: i64) -> Result<(), Error>;
    fn show_text(&self, text: &str, duration_ms: Option<i64>) -> Result<(), Error>;
    fn show_progress(&self) -> Result<(), Error>;
    /// Broadcast a message to all script clients.
    fn script_message(&self, args: &[&str]) -> Result<(), Error>;
    fn script_message_to(&self, target: &str, args: &[&str]) -> Result<(), Error>;
    fn write_watch_later_config(&self) -> Result<(), Error>;
    /// Quit and save the playback position. The engine announces shutdown
    /// asynchronously, exactly as for `Session::quit`.
    fn quit_watch_later(&self) -> Result<(), Error>;
    /// Run an external program detached from the player.
    fn run(&self, program: &str, args: &[&str]) -> Result<(), Error>;
}

impl<E: Engine> CommandExt for Session<E> {
    fn load_file(&self, path: &str, mode: LoadMode) -> Result<(), Error> {
        self.command(
            "loadfile",
            &[NodeValue::from(path), NodeValue::from(mode.as_str())],
        )
    }

    fn load_list(&self, path: &str, mode: LoadMode) -> Result<(), Error> {
        self.command(
            "loadlist",
            &[NodeValue::from(path), NodeValue::from(mode.as_str())],
        )
    }

    fn play(&self, path: &str) -> Result<(), Error> {
        self.load_file(path, LoadMode::Replace)
    }

    fn stop(&self) -> Result<(), Error> {
        self.command("stop", &[])
    }

    fn seek(&self, target: f64, mode: SeekMode, precision: SeekPrecision) -> Result<(), Error> {
        self.command_node(&[
            NodeValue::from("seek"),
            NodeValue::Double(target),
            NodeValue::from(mode.as_str()),
            NodeValue::from(precision.as_str()),
        ])?;
        Ok(())
    }

    fn revert_seek(&self) -> Result<(), Error> {
        self.command("revert-seek", &[])
    }

    fn frame_step(&self) -> Result<(), Error> {
        self.command("frame-step", &[])
    }

    fn frame_back_step(&self) -> Result<(), Error> {
        self.command("frame-back-step", &[])
    }

    fn add(&self, property: &str, amount: f64) -> Result<(), Error> {
        self.command(
            "add",
            &[NodeValue::from(property), NodeValue::Double(amount)],
        )
    }

    fn cycle(&self, property: &str) -> Result<(), Error> {
        self.command("cycle", &[NodeValue::from(property)])
    }

    fn multiply(&self, property: &str, factor: f64) -> Result<(), Error> {
        self.command(
            "multiply",
            &[NodeValue::from(property), NodeValue::Double(factor)],
        )
    }

    fn screenshot(&self, mode: ScreenshotMode) -> Result<(), Error> {
        self.command("screenshot", &[NodeValue::from(mode.as_str())])
    }

    fn screenshot_to_file(&self, path: &str, mode: ScreenshotMode) -> Result<(), Error> {
        self.command(
            "screenshot-to-file",
            &[NodeValue::from(path), NodeValue::from(mode.as_str())],
        )
    }

    fn playlist_next(&self) -> Result<(), Error> {
        self.command("playlist-next", &[])
    }

    fn playlist_prev(&self) -> Result<(), Error> {
        self.command("playlist-prev", &[])
    }

    fn playlist_clear(&self) -> Result<(), Error> {
        self.command("playlist-clear", &[])
    }

    fn playlist_remove(&self, index: Option<i64>) -> Result<(), Error> {
        let which = match index {
            Some(index) => NodeValue::Int64(index),
            None => NodeValue::from("current"),
        };
        self.command("playlist-remove", &[which])
    }

    fn playlist_move(&self, from: i64, to: i64) -> Result<(), Error> {
        self.command(
            "playlist-move",
            &[NodeValue::Int64(from), NodeValue::Int64(to)],
        )
    }

    fn playlist_shuffle(&self) -> Result<(), Error> {
        self.command("playlist-shuffle", &[])
    }

    fn sub_add(&self, path: &str) -> Result<(), Error> {
        self.command("sub-add", &[NodeValue::from(path)])
    }

    fn sub_remove(&self, id: Option<i64>) -> Result<(), Error> {
        match id {
            Some(id) => self.command("sub-remove", &[NodeValue::Int64(id)]),
            None => self.command("sub-remove", &[]),
        }
    }

    fn sub_reload(&self, id: Option<i64>) -> Result<(), Error> {
        match id {
            Some(id) => self.command("sub-reload", &[NodeValue::Int64(id)]),
            None => self.command("sub-reload", &[]),
        }
    }

    fn sub_step(&self, skip: i64) -> Result<(), Error> {
        self.command("sub-step", &[NodeValue::Int64(skip)])
    }

    fn sub_seek(&self, skip: i64) -> Result<(), Error> {
        self.command("sub-seek", &[NodeValue::Int64(skip)])
    }

    fn show_text(&self, text: &str, duration_ms: Option<i64>) -> Result<(), Error> {
        match duration_ms {
            Some(duration) => self.command(
                "show-text",
                &[NodeValue::from(text), NodeValue::Int64(duration)],
            ),
            None => self.command("show-text", &[NodeValue::from(text)]),
        }
    }

    fn show_progress(&self) -> Result<(), Error> {
        self.command("show-progress", &[])
    }

    fn script_message(&self, args: &[&str]) -> Result<(), Error> {
        let words: Vec<NodeValue> = args.iter().map(|arg| NodeValue::from(*arg)).collect();
        self.command("script-message", &words)
    }

    fn script_message_to(&self, target: &str, args: &[&str]) -> Result<(), Error> {
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push(NodeValue::from(target));
        words.extend(args.iter().map(|arg| NodeValue::from(*arg)));
        self.command("script-message-to", &words)
    }

    fn write_watch_later_config(&self) -> Result<(), Error> {
        self.command("write-watch-later-config", &[])
    }

    fn quit_watch_later(&self) -> Result<(), Error> {
        self.command("quit-watch-later", &[])
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<(), Error> {
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push(NodeValue::from(program));
        words.extend(args.iter().map(|arg| NodeValue::from(*arg)));
        self.command("run", &words)
    }
}
