//! Sink implementations
//!
//! Contains the rotating FileSink and its on-disk rotation helpers.

mod file;
pub mod rotation;

pub use self::file::{file_sink_name, FileSink, FileSinkConfig};
