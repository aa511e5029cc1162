//! Core type definitions for memscan
//!
//! Fundamental types used throughout the crate: the address wrapper, typed
//! values and their byte codec, match rows, watch entries, and error types.

mod address;
mod error;
mod match_row;
mod value;
mod watch;

// Re-export all public types
pub use address::{parse_address, Address};
pub use error::{ScanError, ScanResult};
pub use match_row::{MatchId, MatchRow};
pub use value::{ScanValue, TypeTag};
pub use watch::{CheatListFile, CheatRecord, WatchEntry};

// Common type aliases
pub type ProcessId = u32;
