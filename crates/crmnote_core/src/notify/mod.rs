//! Update notification fan-out.
//!
//! Transports (WebSocket handlers and the like) live outside the core; they
//! plug in through `UpdateSink`.

pub mod registry;
