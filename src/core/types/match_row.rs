//! Scan match rows
//!
//! A match row is valid only for the current result generation: any reset
//! or new scan invalidates every previously issued match id.

use super::{Address, TypeTag};
use serde::{Deserialize, Serialize};

/// Identifier the engine assigns to a match within one result generation
pub type MatchId = u64;

/// One address+value+type result row from a scan round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub match_id: MatchId,
    pub address: Address,
    /// Offset of the address within its region
    pub offset: u64,
    /// Region classification as reported by the engine (e.g. `heap`)
    pub region_type: String,
    /// Current display text, refreshed in place by the watch worker
    pub value_text: String,
    pub tag: TypeTag,
    /// Cleared when a background refresh fails to read or decode the row
    pub valid: bool,
}

impl MatchRow {
    pub fn new(
        match_id: MatchId,
        address: Address,
        offset: u64,
        region_type: String,
        value_text: String,
        tag: TypeTag,
    ) -> Self {
        MatchRow {
            match_id,
            address,
            offset,
            region_type,
            value_text,
            tag,
            valid: true,
        }
    }
}
