//! Request vocabulary of the engine protocol
//!
//! One textual command per request; `Display` produces the exact wire text.

use crate::core::types::{Address, ProcessId, TypeTag};
use std::fmt;

/// A single engine request
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Full engine reset; with a pid this is the attach path
    Reset { pid: Option<ProcessId> },
    /// Re-target without a full reset
    Pid(ProcessId),
    /// Pre-scan configuration, e.g. `scan_data_type` / `region_scan_level`
    Option { key: String, value: String },
    /// Start a scan or refine with an already validated predicate
    Find(String),
    /// Cooperative abort of an in-progress scan
    Stop,
    /// Process liveness, match count and scan progress
    Info(ProcessId),
    /// First page of the match set
    List(usize),
    /// Following pages
    Next(usize),
    /// Read raw memory
    Dump { addr: Address, len: usize },
    /// Write a typed value
    Write {
        tag: TypeTag,
        addr: Address,
        value: String,
    },
    /// Release all engine resources
    Exit,
}

impl Command {
    pub fn option(key: impl Into<String>, value: impl Into<String>) -> Self {
        Command::Option {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Reset { pid: None } => f.write_str("reset"),
            Command::Reset { pid: Some(pid) } => write!(f, "reset {}", pid),
            Command::Pid(pid) => write!(f, "pid {}", pid),
            Command::Option { key, value } => write!(f, "option {} {}", key, value),
            Command::Find(predicate) => write!(f, "find {}", predicate),
            Command::Stop => f.write_str("stop"),
            Command::Info(pid) => write!(f, "info {}", pid),
            Command::List(n) => write!(f, "list {}", n),
            Command::Next(n) => write!(f, "next {}", n),
            Command::Dump { addr, len } => write!(f, "dump {:x} {}", addr, len),
            Command::Write { tag, addr, value } => {
                write!(f, "write {} {:x} {}", tag, addr, value)
            }
            Command::Exit => f.write_str("exit"),
        }
    }
}
