//! Purpose: Generate typed property accessors over the registry table.
//! Exports: `PropertyExt`.
//! Role: Convenience layer; every accessor goes through the same registry
//! gate as `Session::get_property`.

use crate::core::engine::Engine;
use crate::core::error::Error;
use crate::core::node::{FromNode, NodeValue};
use crate::core::session::Session;

macro_rules! properties {
    ($(
        $(#[$doc:meta])*
        $getter:ident $(, $setter:ident)? => $name:literal as $type:ty;
    )*) => {
        /// Typed accessors for the common engine properties. Read methods
        /// decode the registry wire format into plain Rust values; write
        /// methods accept the same type.
        pub trait PropertyExt {
            $(
                $(#[$doc])*
                fn $getter(&self) -> Result<$type, Error>;
                $(
                    #[doc = concat!("Write the `", $name, "` property.")]
                    fn $setter(&self, value: $type) -> Result<(), Error>;
                )?
            )*
        }

        impl<E: Engine> PropertyExt for Session<E> {
            $(
                fn $getter(&self) -> Result<$type, Error> {
                    <$type as FromNode>::from_node(self.get_property($name)?)
                }
                $(
                    fn $setter(&self, value: $type) -> Result<(), Error> {
                        self.set_property($name, value)
                    }
                )?
            )*
        }
    };
}

properties! {
    /// Whether playback is paused.
    pause, set_pause => "pause" as bool;
    mute, set_mute => "mute" as bool;
    /// Player volume, `0.0` up to `volume_max`.
    volume, set_volume => "volume" as f64;
    volume_max, set_volume_max => "volume-max" as f64;
    /// Playback rate multiplier, `1.0` for normal speed.
    speed, set_speed => "speed" as f64;
    /// Length of the current file in seconds. Unavailable until the file is
    /// loaded and for live streams.
    duration => "duration" as f64;
    /// Position in the current file in seconds.
    time_pos, set_time_pos => "time-pos" as f64;
    time_remaining => "time-remaining" as f64;
    playback_time, set_playback_time => "playback-time" as f64;
    percent_pos, set_percent_pos => "percent-pos" as f64;
    /// Display title of the current file.
    media_title => "media-title" as String;
    filename => "filename" as String;
    path => "path" as String;
    hwdec, set_hwdec => "hwdec" as String;
    fullscreen, set_fullscreen => "fullscreen" as bool;
    window_scale, set_window_scale => "window-scale" as f64;
    /// True while the player is idle with no file loaded.
    idle_active => "idle-active" as bool;
    core_idle => "core-idle" as bool;
    eof_reached => "eof-reached" as bool;
    seekable => "seekable" as bool;
    chapter, set_chapter => "chapter" as i64;
    chapters => "chapters" as i64;
    playlist_pos, set_playlist_pos => "playlist-pos" as i64;
    playlist_count => "playlist-count" as i64;
    sub_delay, set_sub_delay => "sub-delay" as f64;
    /// Full track table as a node array, one map per track.
    track_list => "track-list" as NodeValue;
    playlist => "playlist" as NodeValue;
    metadata => "metadata" as NodeValue;
    chapter_list => "chapter-list" as NodeValue;
    video_params => "video-params" as NodeValue;
    audio_params => "audio-params" as NodeValue;
}
