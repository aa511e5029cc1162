//! Session state machine types

use crate::core::types::{ProcessId, TypeTag};
use serde::{Deserialize, Serialize};

/// Where the session is in its lifecycle.
///
/// `Idle → Attached → Scanning → Results`, looping back to `Scanning` on a
/// refine or to `Attached` on reset; `Exiting` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    Attached,
    Scanning,
    Results,
    Exiting,
}

impl ScanPhase {
    /// While scanning the progress ticker runs and the watch ticker rests
    pub const fn is_scanning(&self) -> bool {
        matches!(self, ScanPhase::Scanning)
    }
}

/// Coarse setting narrowing which memory regions the engine scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanScope {
    Basic,
    Normal,
    ReadOnly,
    Full,
}

impl ScanScope {
    /// Engine-side `region_scan_level` value
    pub const fn level(&self) -> u8 {
        match self {
            ScanScope::Basic => 1,
            ScanScope::Normal => 2,
            ScanScope::ReadOnly => 3,
            ScanScope::Full => 4,
        }
    }
}

impl Default for ScanScope {
    fn default() -> Self {
        ScanScope::Normal
    }
}

/// Kind of predicate a validated scan command carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Bare literal: exact value
    Exact,
    /// `a..b` inclusive range
    Range,
    /// Bare `=`: same as previous scan
    Unchanged,
    /// Bare `!=`: changed since previous scan
    Changed,
    /// Bare `>` or `+`: grew since previous scan
    Increased,
    /// `+ N`: grew by exactly N
    IncreasedBy,
    /// Bare `<` or `-`: shrank since previous scan
    Decreased,
    /// `- N`: shrank by exactly N
    DecreasedBy,
    /// `> N`
    GreaterThan,
    /// `< N`
    LessThan,
    /// `!= N`
    NotEqual,
    /// First-scan `?`: take a snapshot of everything
    Snapshot,
    /// Refine `?`: update stored values without narrowing
    Update,
    /// String search
    MatchString,
    /// Byte pattern with `??` wildcards
    ByteMask,
}

impl MatchKind {
    /// Kinds that compare against a previous generation and are therefore
    /// illegal on the first scan
    pub const fn requires_previous(&self) -> bool {
        matches!(
            self,
            MatchKind::Unchanged
                | MatchKind::Changed
                | MatchKind::Increased
                | MatchKind::Decreased
                | MatchKind::IncreasedBy
                | MatchKind::DecreasedBy
                | MatchKind::Update
        )
    }
}

/// Mutable session facts, guarded by the controller
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: ScanPhase,
    /// 0 while nothing is attached
    pub pid: ProcessId,
    pub scan_tag: TypeTag,
    pub scope: ScanScope,
    pub match_kind: Option<MatchKind>,
    pub first_scan: bool,
    pub exe_link: Option<String>,
    pub region_count: u64,
    pub match_count: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            phase: ScanPhase::Idle,
            pid: 0,
            scan_tag: TypeTag::Int32,
            scope: ScanScope::default(),
            match_kind: None,
            first_scan: true,
            exe_link: None,
            region_count: 0,
            match_count: 0,
        }
    }
}

impl SessionState {
    pub const fn is_attached(&self) -> bool {
        self.pid != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_levels() {
        assert_eq!(ScanScope::Basic.level(), 1);
        assert_eq!(ScanScope::Normal.level(), 2);
        assert_eq!(ScanScope::ReadOnly.level(), 3);
        assert_eq!(ScanScope::Full.level(), 4);
        assert_eq!(ScanScope::default(), ScanScope::Normal);
    }

    #[test]
    fn test_refine_only_kinds() {
        assert!(MatchKind::Increased.requires_previous());
        assert!(MatchKind::Update.requires_previous());
        assert!(!MatchKind::Exact.requires_previous());
        assert!(!MatchKind::Range.requires_previous());
        assert!(!MatchKind::Snapshot.requires_previous());
        assert!(!MatchKind::GreaterThan.requires_previous());
    }

    #[test]
    fn test_default_state() {
        let state = SessionState::default();
        assert_eq!(state.phase, ScanPhase::Idle);
        assert!(state.first_scan);
        assert!(!state.is_attached());
        assert_eq!(state.scan_tag, TypeTag::Int32);
    }
}
