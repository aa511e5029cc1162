//! memscan: scan-session controller for an external memory-scanning engine
//!
//! The engine itself (pattern matching, byte-level scanning) is an opaque
//! collaborator reached over a byte-stream protocol. This crate owns the
//! session state machine driving progressive scans, the single-flight
//! command discipline on the transport, the typed value codec, paginated
//! match retrieval, and the periodic watch/lock worker.

pub mod config;
pub mod core;
pub mod engine;
pub mod session;

// Re-export main types from the core module
pub use self::core::types::{
    Address, MatchId, MatchRow, ProcessId, ScanError, ScanResult, ScanValue, TypeTag, WatchEntry,
};

// Session surface
pub use session::{
    check_scan_command, MatchKind, ScanPhase, ScanScope, Session, SessionOptions, TickOutcome,
};

// Engine surface
pub use engine::{CommandSerializer, EngineConn, EngineTransport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_module_accessible() {
        assert_eq!(crate::core::VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(crate::core::AUTHORS, env!("CARGO_PKG_AUTHORS"));
    }

    #[test]
    fn test_address_reexport() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_u64(), 0x1000);
        assert!(Address::null().is_null());
    }

    #[test]
    fn test_value_reexport() {
        let value = ScanValue::U32(42);
        assert_eq!(value.tag(), TypeTag::UInt32);
        assert_eq!(value.to_bytes().len(), 4);
        assert_eq!(TypeTag::String.fixed_size(), None);
    }

    #[test]
    fn test_error_reexport() {
        let err = ScanError::Engine("bad pid".to_string());
        assert!(err.to_string().contains("bad pid"));
        let result: ScanResult<u32> = Ok(7);
        assert!(result.is_ok());
    }

    #[test]
    fn test_session_surface_reexport() {
        let p = check_scan_command(TypeTag::Int32, "5", true).unwrap();
        assert_eq!(p.kind, MatchKind::Exact);
        assert_eq!(ScanScope::default(), ScanScope::Normal);
        assert!(!ScanPhase::Results.is_scanning());
    }
}
