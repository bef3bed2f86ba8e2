//! Realtime gateway: WebSocket upgrade, session loop, and wire events.
//!
//! The WebSocket endpoint at `/ws` is receive-only from the client's point
//! of view: every fanout message is pushed as a `data` event, and frames
//! sent by the client are only used as liveness signals.

pub mod connection;
pub mod handler;
pub mod messages;
