//! In-memory storage of accepted readings
//!
//! Readings live only in RAM. A reboot starts with empty buffers and the
//! channel has to stabilize again before anything is recorded.

pub mod buffer;
pub mod snapshot;

pub use buffer::*;
pub use snapshot::*;
