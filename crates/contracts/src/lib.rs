//! # Contracts
//!
//! Frozen interface contracts shared by every logsink crate: the sink
//! trait, the execution context, error vocabulary, policies and config types.
//! All other crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Entry Model
//! - An entry is an opaque, already-encoded byte sequence
//! - Sinks never inspect entry content

mod config;
mod context;
mod error;
mod policy;
mod sink;

pub use config::*;
pub use context::Context;
pub use error::*;
pub use policy::*;
pub use sink::*;
