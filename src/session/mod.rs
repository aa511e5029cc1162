//! Scan-session control
//!
//! The state machine driving progressive scanning, the pure scan-command
//! validator, and the periodic background workers.

mod command_check;
mod controller;
pub mod state;
mod worker;

pub use command_check::{check_scan_command, ScanPredicate};
pub use controller::{Session, SessionOptions, UNAVAILABLE};
pub use state::{MatchKind, ScanPhase, ScanScope, SessionState};
pub use worker::{spawn_workers, watch_tick, TickOutcome, WorkerHandles};
