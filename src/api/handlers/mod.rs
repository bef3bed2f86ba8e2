//! HTTP endpoint handlers.

pub mod page;
pub mod system;
