//! Core module containing fundamental types for memscan
//!
//! Provides the foundational building blocks used throughout the session
//! controller: address handling, typed values, match rows, watch entries,
//! and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{Address, MatchRow, ScanError, ScanResult, ScanValue, TypeTag, WatchEntry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
