//! Watch entries (the cheat list) and their persisted record form

use super::{Address, ScanResult, TypeTag};
use serde::{Deserialize, Serialize};

/// A user-pinned memory address with a semantic type.
///
/// While `locked` the watch worker only ever writes `value_text` to memory
/// and never overwrites it from a read; while `editing` a background
/// refresh never touches the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub locked: bool,
    pub description: String,
    pub address: Address,
    pub tag: TypeTag,
    /// Cached display text; also the authoritative value while locked
    pub value_text: String,
    pub valid: bool,
    /// Set while the row is under interactive edit
    #[serde(skip)]
    pub editing: bool,
}

impl WatchEntry {
    pub fn new(address: Address, tag: TypeTag, value_text: String, description: String) -> Self {
        WatchEntry {
            locked: false,
            description,
            address,
            tag,
            value_text,
            valid: true,
            editing: false,
        }
    }

    /// True when the worker should force-write this entry each tick
    pub fn wants_write_back(&self) -> bool {
        self.locked && self.valid
    }

    /// True when the worker may refresh this entry from memory
    pub fn wants_refresh(&self) -> bool {
        self.valid && !self.locked
    }
}

/// One element of the persisted cheat-list file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheatRecord {
    pub description: String,
    /// Bare lowercase hex, same as the wire form
    pub address: String,
    #[serde(rename = "type")]
    pub tag: TypeTag,
    pub value: String,
}

/// The cheat-list file: an object with one array field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheatListFile {
    pub cheat_list: Vec<CheatRecord>,
}

impl From<&WatchEntry> for CheatRecord {
    fn from(entry: &WatchEntry) -> Self {
        CheatRecord {
            description: entry.description.clone(),
            address: entry.address.wire(),
            tag: entry.tag,
            value: entry.value_text.clone(),
        }
    }
}

impl CheatRecord {
    /// Loaded rows arrive unlocked and valid
    pub fn into_entry(self) -> ScanResult<WatchEntry> {
        let address = self.address.parse()?;
        Ok(WatchEntry::new(
            address,
            self.tag,
            self.value,
            self.description,
        ))
    }
}
