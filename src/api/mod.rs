//! Purpose: Define the stable public Rust API boundary for mpvbind.
//! Exports: Session types, typed property accessors, and command shortcuts.
//! Role: Public, additive-only surface; the supported path for hosts.
//! Invariants: Names re-exported here keep their meaning across releases.
//! Invariants: The `commands` and `props` submodules stay private; `core`
//! stays reachable but its layout may shift between releases.

mod commands;
mod props;

pub use crate::core::dispatch::{EventHandler, LoopExit};
pub use crate::core::engine::Engine;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorCode, ErrorKind};
pub use crate::core::events::{Event, EventKind, EventPayload};
pub use crate::core::format::{EndFileReason, Format, LogLevel, SubApi, SUPPORTED_API_MAJOR};
pub use crate::core::libmpv::{default_library_name, LibMpv};
pub use crate::core::node::{FromNode, NodeValue};
pub use crate::core::registry::{find as find_property, Access, PropertySpec};
pub use crate::core::session::{MpvSession, ObservationEntry, Session, SessionOptions};
pub use commands::{CommandExt, LoadMode, ScreenshotMode, SeekMode, SeekPrecision};
pub use props::PropertyExt;
