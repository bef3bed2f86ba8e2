//! Producer ingestion: raw TCP listener feeding the fanout.
//!
//! Producers connect without any handshake and write bytes. Every chunk
//! returned by one read becomes one [`crate::domain::Message`]; there is no
//! framing, so a logical record split across reads is relayed as several
//! messages and back-to-back writes may arrive merged.

pub mod listener;

pub use listener::{ProducerListener, pump_connection};
