//! # mission-relay
//!
//! Relays raw bytes pushed by external producer processes to every
//! connected web client over WebSocket, and serves the small web page that
//! bootstraps those clients.
//!
//! ## Architecture
//!
//! ```text
//! Producers (raw TCP, :9998)          Browsers (HTTP + WebSocket, :3010)
//!     │                                   │
//!     ├── ProducerListener (producer/)    ├── HTTP front door (api/)
//!     │                                   ├── Realtime gateway (ws/)
//!     │                                   │
//!     └──────────► Fanout (domain/) ◄─────┘
//!                    │
//!                    └── SessionRegistry
//! ```
//!
//! Every chunk read from a producer is decoded as UTF-8 (lossily) and
//! published once to the sessions registered at that moment. There is no
//! framing, persistence, or acknowledgment.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod producer;
pub mod server;
pub mod ws;
