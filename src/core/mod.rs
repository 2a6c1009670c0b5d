// Core modules implementing the engine binding, marshaling, and dispatch.
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod format;
pub mod libmpv;
pub mod node;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testengine;
