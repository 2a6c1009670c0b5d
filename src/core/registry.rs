//! Purpose: Catalog the engine's documented properties with format and access.
//! Exports: `Access`, `PropertySpec`, `PROPERTIES`, `find`, error helpers.
//! Role: Local gatekeeper consulted before any native property call.
//! Invariants: `PROPERTIES` is sorted by name and deduplicated (binary search).

use crate::core::error::{Error, ErrorKind};
use crate::core::format::Format;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub fn allows_read(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub fn allows_write(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PropertySpec {
    pub name: &'static str,
    pub format: Format,
    pub access: Access,
}

const fn spec(name: &'static str, format: Format, access: Access) -> PropertySpec {
    PropertySpec {
        name,
        format,
        access,
    }
}

use Access::{Read, ReadWrite, Write};
use Format::{Double, Flag, Int64, Node, String as Str};

/// Property table reconstructed from the mpv manual. Formats pick the widest
/// faithful decoding; polymorphic properties (track selectors, loop counts)
/// use `Node`.
pub const PROPERTIES: &[PropertySpec] = &[
    spec("ab-loop-a", Node, ReadWrite),
    spec("ab-loop-b", Node, ReadWrite),
    spec("aid", Node, ReadWrite),
    spec("angle", Int64, ReadWrite),
    spec("ao-mute", Flag, ReadWrite),
    spec("ao-volume", Double, ReadWrite),
    spec("audio", Node, ReadWrite),
    spec("audio-bitrate", Double, Read),
    spec("audio-channels", Str, Read),
    spec("audio-codec", Str, Read),
    spec("audio-codec-name", Str, Read),
    spec("audio-delay", Double, ReadWrite),
    spec("audio-device", Str, ReadWrite),
    spec("audio-device-list", Node, Read),
    spec("audio-params", Node, Read),
    spec("audio-pts", Double, Read),
    spec("audio-speed-correction", Double, Read),
    spec("avsync", Double, Read),
    spec("brightness", Int64, ReadWrite),
    spec("cache", Str, ReadWrite),
    spec("cache-buffering-state", Int64, Read),
    spec("cache-speed", Int64, Read),
    spec("chapter", Int64, ReadWrite),
    spec("chapter-list", Node, Read),
    spec("chapter-metadata", Node, Read),
    spec("chapters", Int64, Read),
    spec("container-fps", Double, Read),
    spec("contrast", Int64, ReadWrite),
    spec("core-idle", Flag, Read),
    spec("current-ao", Str, Read),
    spec("current-demuxer", Str, Read),
    spec("current-vo", Str, Read),
    spec("demuxer-cache-duration", Double, Read),
    spec("demuxer-cache-idle", Flag, Read),
    spec("demuxer-cache-state", Node, Read),
    spec("demuxer-cache-time", Double, Read),
    spec("dheight", Int64, Read),
    spec("display-fps", Double, ReadWrite),
    spec("display-names", Node, Read),
    spec("duration", Double, Read),
    spec("dwidth", Int64, Read),
    spec("edition", Int64, ReadWrite),
    spec("edition-list", Node, Read),
    spec("editions", Int64, Read),
    spec("eof-reached", Flag, Read),
    spec("estimated-display-fps", Double, Read),
    spec("estimated-frame-count", Int64, Read),
    spec("estimated-frame-number", Int64, Read),
    spec("estimated-vf-fps", Double, Read),
    spec("file-format", Str, Read),
    spec("file-size", Int64, Read),
    spec("filename", Str, Read),
    spec("filtered-metadata", Node, Read),
    spec("frame-drop-count", Int64, Read),
    spec("fullscreen", Flag, ReadWrite),
    spec("gamma", Int64, ReadWrite),
    spec("height", Int64, Read),
    spec("hr-seek", Str, ReadWrite),
    spec("hue", Int64, ReadWrite),
    spec("hwdec", Str, ReadWrite),
    spec("hwdec-current", Str, Read),
    spec("hwdec-interop", Str, Read),
    spec("idle-active", Flag, Read),
    spec("loop", Node, ReadWrite),
    spec("loop-file", Node, ReadWrite),
    spec("loop-playlist", Node, ReadWrite),
    spec("media-title", Str, Read),
    spec("metadata", Node, Read),
    spec("mute", Flag, ReadWrite),
    spec("ontop", Flag, ReadWrite),
    spec("osd-height", Int64, Read),
    spec("osd-level", Int64, ReadWrite),
    spec("osd-width", Int64, Read),
    spec("path", Str, Read),
    spec("pause", Flag, ReadWrite),
    spec("paused-for-cache", Flag, Read),
    spec("percent-pos", Double, ReadWrite),
    spec("playback-abort", Flag, Read),
    spec("playback-time", Double, ReadWrite),
    spec("playlist", Node, Read),
    spec("playlist-count", Int64, Read),
    spec("playlist-current-pos", Int64, ReadWrite),
    spec("playlist-pos", Int64, ReadWrite),
    spec("playlist-pos-1", Int64, ReadWrite),
    spec("playtime-remaining", Double, Read),
    spec("program", Int64, Write),
    spec("protocol-list", Node, Read),
    spec("saturation", Int64, ReadWrite),
    spec("secondary-sid", Node, ReadWrite),
    spec("seekable", Flag, Read),
    spec("seeking", Flag, Read),
    spec("sid", Node, ReadWrite),
    spec("speed", Double, ReadWrite),
    spec("stream-end", Int64, Read),
    spec("stream-pos", Int64, ReadWrite),
    spec("sub", Node, ReadWrite),
    spec("sub-delay", Double, ReadWrite),
    spec("sub-fps", Double, ReadWrite),
    spec("sub-pos", Int64, ReadWrite),
    spec("sub-speed", Double, ReadWrite),
    spec("sub-text", Str, Read),
    spec("sub-visibility", Flag, ReadWrite),
    spec("time-pos", Double, ReadWrite),
    spec("time-remaining", Double, Read),
    spec("time-start", Double, Read),
    spec("total-avsync-change", Double, Read),
    spec("track-list", Node, Read),
    spec("vid", Node, ReadWrite),
    spec("video", Node, ReadWrite),
    spec("video-aspect", Node, ReadWrite),
    spec("video-bitrate", Double, Read),
    spec("video-codec", Str, Read),
    spec("video-format", Str, Read),
    spec("video-out-params", Node, Read),
    spec("video-pan-x", Double, ReadWrite),
    spec("video-pan-y", Double, ReadWrite),
    spec("video-params", Node, Read),
    spec("video-rotate", Int64, ReadWrite),
    spec("video-speed-correction", Double, Read),
    spec("video-zoom", Double, ReadWrite),
    spec("volume", Double, ReadWrite),
    spec("volume-max", Double, ReadWrite),
    spec("width", Int64, Read),
    spec("window-scale", Double, ReadWrite),
    spec("working-directory", Str, Read),
];

pub fn find(name: &str) -> Option<&'static PropertySpec> {
    PROPERTIES
        .binary_search_by(|candidate| candidate.name.cmp(name))
        .ok()
        .map(|index| &PROPERTIES[index])
}

pub fn unknown_property_error(name: &str) -> Error {
    Error::new(ErrorKind::UnknownProperty)
        .with_message(format!("property {name:?} is not in the registry"))
        .with_hint("Property names use hyphens, like `time-pos`.")
}

pub fn access_denied_error(name: &str, operation: &str) -> Error {
    Error::new(ErrorKind::AccessDenied)
        .with_message(format!("property {name:?} does not allow {operation}"))
}

#[cfg(test)]
mod tests {
    use super::{access_denied_error, find, unknown_property_error, Access, PROPERTIES};
    use crate::core::error::ErrorKind;
    use crate::core::format::Format;

    #[test]
    fn table_is_sorted_and_deduplicated() {
        for pair in PROPERTIES.windows(2) {
            assert!(
                pair[0].name < pair[1].name,
                "{} must sort before {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn find_hits_known_entries() {
        let pause = find("pause").expect("pause");
        assert_eq!(pause.format, Format::Flag);
        assert_eq!(pause.access, Access::ReadWrite);

        let duration = find("duration").expect("duration");
        assert_eq!(duration.format, Format::Double);
        assert_eq!(duration.access, Access::Read);

        let track_list = find("track-list").expect("track-list");
        assert_eq!(track_list.format, Format::Node);

        let media_title = find("media-title").expect("media-title");
        assert_eq!(media_title.format, Format::String);
    }

    #[test]
    fn find_misses_unknown_names() {
        assert!(find("not-a-real-property").is_none());
        assert!(find("").is_none());
        assert!(find("time_pos").is_none());
    }

    #[test]
    fn program_is_write_only() {
        let program = find("program").expect("program");
        assert_eq!(program.access, Access::Write);
        assert!(!program.access.allows_read());
    }

    #[test]
    fn access_helpers_cover_both_directions() {
        assert!(Access::Read.allows_read());
        assert!(!Access::Read.allows_write());
        assert!(Access::Write.allows_write());
        assert!(!Access::Write.allows_read());
        assert!(Access::ReadWrite.allows_read());
        assert!(Access::ReadWrite.allows_write());
    }

    #[test]
    fn error_helpers_pick_the_right_kinds() {
        assert_eq!(
            unknown_property_error("bogus").kind(),
            ErrorKind::UnknownProperty
        );
        assert_eq!(
            access_denied_error("duration", "writes").kind(),
            ErrorKind::AccessDenied
        );
    }
}
