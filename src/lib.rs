//! Purpose: Shared library crate used by the `mpvbind` CLI and tests.
//! Exports: `api` (stable session surface), `core` (binding internals).
//! Role: Run-time bindings to a native media playback engine.
//! Invariants: Hosts depend on `api`; the `core` layout may shift between releases.
//! Invariants: Raw engine pointers never cross out of `core::libmpv`.
pub mod api;
pub mod core;
