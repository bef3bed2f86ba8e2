//! Domain layer: messages, session identity, and the broadcast fanout.
//!
//! The [`Fanout`] owns the only shared mutable state in the process, the
//! [`SessionRegistry`] of live client sessions.

pub mod fanout;
pub mod message;
pub mod session_id;
pub mod session_registry;

pub use fanout::{Fanout, Subscription};
pub use message::Message;
pub use session_id::SessionId;
pub use session_registry::{DeliveryFailure, SessionHandle, SessionRegistry};
