//! Session controller
//!
//! Owns the attachment, the scan configuration, the `Idle → Attached →
//! Scanning → Results` state machine, the watch and match collections, and
//! orchestrates the serializer, codec and streamer. All engine traffic from
//! user-triggered operations acquires the serializer blocking; the
//! background ticks in [`super::worker`] acquire non-blocking.

use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::core::types::{
    Address, CheatListFile, CheatRecord, MatchId, MatchRow, ProcessId, ScanError, ScanResult,
    ScanValue, TypeTag, WatchEntry,
};
use crate::engine::{fetch_matches, CommandSerializer, EngineConn};
use crate::session::command_check::check_scan_command;
use crate::session::state::{ScanPhase, ScanScope, SessionState};

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_RESULT_LIST_LIMIT};

/// Display text for a row whose read or decode failed
pub const UNAVAILABLE: &str = "??";

/// Tunables fixed at session creation
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub page_size: usize,
    pub result_list_limit: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            page_size: DEFAULT_PAGE_SIZE,
            result_list_limit: DEFAULT_RESULT_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Default)]
struct WatchList {
    entries: Vec<WatchEntry>,
    visible: Option<Range<usize>>,
}

#[derive(Debug, Default)]
struct MatchTable {
    rows: Vec<MatchRow>,
    visible: Option<Range<usize>>,
}

/// One attached-process scanning dialogue and its state.
///
/// Every operation goes through this object; nothing is ambient. The
/// collections are only ever mutated by a caller that holds (or has just
/// released) the serializer, which keeps engine traffic and row updates in
/// a single ordering domain.
pub struct Session {
    engine: CommandSerializer,
    state: Mutex<SessionState>,
    watch: Mutex<WatchList>,
    matches: Mutex<MatchTable>,
    opts: SessionOptions,
    progress_active: AtomicBool,
    watch_active: AtomicBool,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    pub fn new(conn: EngineConn, opts: SessionOptions) -> Self {
        Session {
            engine: CommandSerializer::new(conn),
            state: Mutex::new(SessionState::default()),
            watch: Mutex::new(WatchList::default()),
            matches: Mutex::new(MatchTable::default()),
            opts,
            progress_active: AtomicBool::new(false),
            watch_active: AtomicBool::new(true),
        }
    }

    /// The single-flight gate on the engine connection. Exposed so callers
    /// with bespoke needs (raw dumps, tests) share the same ordering
    /// domain as every session operation.
    pub fn serializer(&self) -> &CommandSerializer {
        &self.engine
    }

    pub fn options(&self) -> &SessionOptions {
        &self.opts
    }

    // ------------------------------------------------------------------
    // state access

    pub fn phase(&self) -> ScanPhase {
        locked(&self.state).phase
    }

    pub fn state_snapshot(&self) -> SessionState {
        locked(&self.state).clone()
    }

    pub fn match_count(&self) -> u64 {
        locked(&self.state).match_count
    }

    /// True while the progress ticker should do work
    pub fn progress_ticker_active(&self) -> bool {
        self.progress_active.load(Ordering::Acquire)
    }

    /// True while the watch ticker should do work
    pub fn watch_ticker_active(&self) -> bool {
        self.watch_active.load(Ordering::Acquire)
    }

    /// The two tickers are mutually exclusive and swap exactly on the
    /// `Scanning`↔other transitions.
    fn set_phase(&self, state: &mut SessionState, phase: ScanPhase) {
        state.phase = phase;
        self.progress_active
            .store(phase == ScanPhase::Scanning, Ordering::Release);
        self.watch_active.store(
            !matches!(phase, ScanPhase::Scanning | ScanPhase::Exiting),
            Ordering::Release,
        );
    }

    // ------------------------------------------------------------------
    // state machine operations

    /// Attaches to `pid`: full engine reset configured for the process.
    /// On failure no session field is mutated.
    pub async fn attach(&self, pid: ProcessId) -> ScanResult<()> {
        if pid == 0 {
            return Err(ScanError::validation("Invalid pid: 0"));
        }

        let attach_info = {
            let mut conn = self.engine.acquire().await;
            conn.reset(Some(pid)).await?
        };

        {
            let mut state = locked(&self.state);
            state.pid = pid;
            state.first_scan = true;
            state.match_kind = None;
            state.match_count = 0;
            state.region_count = attach_info.regions_count;
            state.exe_link =
                (!attach_info.exelink.is_empty()).then(|| attach_info.exelink.clone());
            self.set_phase(&mut state, ScanPhase::Attached);
        }
        locked(&self.matches).rows.clear();
        for entry in &mut locked(&self.watch).entries {
            entry.locked = false;
        }

        info!(pid, regions = attach_info.regions_count, "attached to process");
        Ok(())
    }

    /// Validates `text` locally, configures the engine on a first scan
    /// (which forces a reset, discarding the empty prior result set), and
    /// issues the scan predicate. Any previously issued match ids become
    /// invalid.
    pub async fn configure_and_scan(
        &self,
        text: &str,
        tag: TypeTag,
        scope: ScanScope,
    ) -> ScanResult<()> {
        let (pid, first_scan) = {
            let state = locked(&self.state);
            (state.pid, state.first_scan)
        };
        if pid == 0 {
            return Err(ScanError::NoProcess);
        }

        // rejected commands never touch the engine
        let predicate = check_scan_command(tag, text, first_scan)?;

        {
            let mut conn = self.engine.acquire().await;
            if first_scan {
                conn.set_option("scan_data_type", tag.name()).await?;
                conn.set_option("region_scan_level", &scope.level().to_string())
                    .await?;
                conn.reset(None).await?;
            }
            conn.find(&predicate.text).await?;
        }

        {
            let mut state = locked(&self.state);
            state.scan_tag = tag;
            state.scope = scope;
            state.first_scan = false;
            state.match_kind = Some(predicate.kind);
            self.set_phase(&mut state, ScanPhase::Scanning);
        }
        locked(&self.matches).rows.clear();

        debug!(predicate = %predicate.text, "scan issued");
        Ok(())
    }

    /// Non-blocking progress poll; `None` means the serializer was busy
    /// and the tick was skipped. At a reported fraction ≥ 1.0 the scan is
    /// finished: the match count is fetched, the match table repopulated,
    /// and the tickers swap back.
    pub async fn poll_progress(&self) -> ScanResult<Option<f64>> {
        let Some(mut conn) = self.engine.try_acquire() else {
            return Ok(None);
        };
        let pid = locked(&self.state).pid;
        if pid == 0 {
            return Ok(None);
        }

        let reply = conn.info(pid).await?;
        if reply.is_process_dead {
            drop(conn);
            self.handle_process_gone(pid);
            return Err(ScanError::ProcessGone(pid));
        }

        let progress = reply.scan_progress;
        if progress >= 1.0 && self.phase() == ScanPhase::Scanning {
            self.finish_scan(&mut conn, pid).await?;
        }
        Ok(Some(progress))
    }

    /// Cooperative abort; the session lands in `Results` with whatever
    /// partial match count the engine reports.
    pub async fn stop(&self) -> ScanResult<()> {
        let pid = locked(&self.state).pid;
        if pid == 0 {
            return Err(ScanError::NoProcess);
        }
        let mut conn = self.engine.acquire().await;
        conn.stop().await?;
        self.finish_scan(&mut conn, pid).await
    }

    /// Drops the result view: bare engine reset, `first_scan` raised,
    /// match table and count cleared. Idempotent.
    pub async fn reset(&self) -> ScanResult<()> {
        {
            let mut conn = self.engine.acquire().await;
            conn.reset(None).await?;
        }

        let mut state = locked(&self.state);
        state.first_scan = true;
        state.match_kind = None;
        state.match_count = 0;
        let next = if state.is_attached() {
            ScanPhase::Attached
        } else {
            ScanPhase::Idle
        };
        self.set_phase(&mut state, next);
        drop(state);

        locked(&self.matches).rows.clear();
        Ok(())
    }

    /// Releases engine resources; the session is unusable afterwards.
    pub async fn shutdown(&self) -> ScanResult<()> {
        {
            let mut state = locked(&self.state);
            self.set_phase(&mut state, ScanPhase::Exiting);
        }
        let mut conn = self.engine.acquire().await;
        if let Err(err) = conn.exit().await {
            warn!(error = %err, "engine exit failed");
        }
        Ok(())
    }

    /// Fetches the final count and repopulates the match table. Result
    /// sets beyond the display limit leave the table empty.
    async fn finish_scan(&self, conn: &mut EngineConn, pid: ProcessId) -> ScanResult<()> {
        let reply = conn.info(pid).await?;
        let found = reply.found;

        let rows = if found > 0 && found <= self.opts.result_list_limit {
            fetch_matches(conn, self.opts.page_size).await?
        } else {
            if found > self.opts.result_list_limit {
                debug!(found, limit = self.opts.result_list_limit, "match set over display limit");
            }
            Vec::new()
        };

        {
            let mut state = locked(&self.state);
            state.match_count = found;
            self.set_phase(&mut state, ScanPhase::Results);
        }
        locked(&self.matches).rows = rows;

        info!(found, "scan finished");
        Ok(())
    }

    /// The attached process died: drop the attachment and the result view.
    /// Watch entries are user-owned and stay put.
    pub(crate) fn handle_process_gone(&self, pid: ProcessId) {
        warn!(pid, "target process is dead");
        let mut state = locked(&self.state);
        state.pid = 0;
        state.first_scan = true;
        state.match_count = 0;
        state.exe_link = None;
        state.region_count = 0;
        self.set_phase(&mut state, ScanPhase::Idle);
        drop(state);
        locked(&self.matches).rows.clear();
    }

    // ------------------------------------------------------------------
    // manual memory access

    /// Reads and decodes one value, blocking on the serializer. `Ok(None)`
    /// is an unreadable or undecodable target, not an error.
    pub async fn read_value(
        &self,
        addr: Address,
        tag: TypeTag,
        prior: &str,
    ) -> ScanResult<Option<ScanValue>> {
        let mut conn = self.engine.acquire().await;
        read_value_with(&mut conn, addr, tag, prior).await
    }

    /// Writes one typed value, blocking on the serializer
    pub async fn write_value(&self, addr: Address, tag: TypeTag, value: &str) -> ScanResult<()> {
        let mut conn = self.engine.acquire().await;
        conn.write(tag, addr, value).await
    }

    // ------------------------------------------------------------------
    // watch list (cheat list)

    pub fn watch_entries(&self) -> Vec<WatchEntry> {
        locked(&self.watch).entries.clone()
    }

    pub fn match_rows(&self) -> Vec<MatchRow> {
        locked(&self.matches).rows.clone()
    }

    /// Rows the presentation layer currently shows; only these are
    /// refreshed by the watch worker. `None` (the default) means all.
    pub fn set_visible_watch_rows(&self, range: Option<Range<usize>>) {
        locked(&self.watch).visible = range;
    }

    pub fn set_visible_match_rows(&self, range: Option<Range<usize>>) {
        locked(&self.matches).visible = range;
    }

    /// Adds an entry at the top of the list
    pub fn add_watch(&self, addr: Address, tag: TypeTag, value_text: String, description: String) {
        let entry = WatchEntry::new(addr, tag, value_text, description);
        locked(&self.watch).entries.insert(0, entry);
    }

    /// Manual add: a fresh entry with a type-appropriate zero value
    pub fn add_watch_manual(
        &self,
        addr: Address,
        tag: TypeTag,
        length: usize,
        description: Option<String>,
    ) {
        let description = description.unwrap_or_else(|| "No Description".to_string());
        self.add_watch(addr, tag, tag.zero_text(length), description);
    }

    /// Promotes a match row into the watch list
    pub fn promote_match(&self, match_id: MatchId) -> ScanResult<()> {
        let row = locked(&self.matches)
            .rows
            .iter()
            .find(|r| r.match_id == match_id)
            .cloned()
            .ok_or_else(|| ScanError::validation(format!("No such match: {}", match_id)))?;
        self.add_watch(
            row.address,
            row.tag,
            row.value_text,
            "No Description".to_string(),
        );
        Ok(())
    }

    pub fn remove_watch(&self, index: usize) {
        let mut watch = locked(&self.watch);
        if index < watch.entries.len() {
            watch.entries.remove(index);
        }
    }

    pub fn clear_watch(&self) {
        locked(&self.watch).entries.clear();
    }

    /// Only valid rows can lock; locking makes the cached value
    /// authoritative until unlocked.
    pub fn set_locked(&self, index: usize, lock: bool) {
        let mut watch = locked(&self.watch);
        if let Some(entry) = watch.entries.get_mut(index) {
            if entry.valid {
                entry.locked = lock;
            }
        }
    }

    /// Marks a row as under interactive edit; the worker never touches an
    /// editing row.
    pub fn set_editing(&self, index: usize, editing: bool) {
        let mut watch = locked(&self.watch);
        if let Some(entry) = watch.entries.get_mut(index) {
            entry.editing = editing;
        }
    }

    pub fn edit_description(&self, index: usize, text: String) {
        let mut watch = locked(&self.watch);
        if let Some(entry) = watch.entries.get_mut(index) {
            entry.description = text;
            entry.editing = false;
        }
    }

    /// Applies a value edit. Unlocked rows write through to memory right
    /// away; locked rows leave enforcement to the watch worker.
    pub async fn edit_value(&self, index: usize, text: String) -> ScanResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let write_through = {
            let mut watch = locked(&self.watch);
            let Some(entry) = watch.entries.get_mut(index) else {
                return Ok(());
            };
            entry.editing = false;
            if !entry.valid {
                return Ok(());
            }
            entry.value_text = text.clone();
            (!entry.locked).then(|| (entry.address, entry.tag))
        };
        if let Some((addr, tag)) = write_through {
            self.write_value(addr, tag, &text).await?;
        }
        Ok(())
    }

    /// Retypes a row. Switching to `string`/`bytearray` re-reads memory at
    /// the old size so the cached text matches the new rendering. Always
    /// unlocks.
    pub async fn edit_type(&self, index: usize, new_tag: TypeTag) -> ScanResult<()> {
        let reformat = {
            let watch = locked(&self.watch);
            let Some(entry) = watch.entries.get(index) else {
                return Ok(());
            };
            if entry.tag == new_tag {
                return Ok(());
            }
            matches!(new_tag, TypeTag::String | TypeTag::ByteArray)
                .then(|| (entry.address, entry.tag, entry.value_text.clone()))
        };

        let mut new_text = None;
        if let Some((addr, old_tag, prior)) = reformat {
            let mut conn = self.engine.acquire().await;
            // old type's size, new type's rendering
            if let Some(size) = old_tag.read_size(&prior) {
                let bytes = conn.dump(addr, size).await?.bytes();
                new_text = ScanValue::decode(new_tag, &bytes).map(|v| v.to_string());
            }
        }

        let mut watch = locked(&self.watch);
        if let Some(entry) = watch.entries.get_mut(index) {
            entry.tag = new_tag;
            entry.locked = false;
            entry.editing = false;
            if let Some(text) = new_text {
                entry.value_text = text;
            }
        }
        Ok(())
    }

    /// Applies one worker read result, unless the row was edited in the
    /// meantime (edit-in-progress always wins).
    pub(crate) fn apply_watch_refresh(&self, index: usize, addr: Address, value: Option<ScanValue>) {
        let mut watch = locked(&self.watch);
        let Some(entry) = watch.entries.get_mut(index) else {
            return;
        };
        // the list may have shifted under us
        if entry.address != addr || entry.editing || entry.locked {
            return;
        }
        match value {
            Some(v) => entry.value_text = v.to_string(),
            None => {
                entry.valid = false;
                entry.locked = false;
                entry.value_text = UNAVAILABLE.to_string();
            }
        }
    }

    pub(crate) fn apply_match_refresh(
        &self,
        index: usize,
        match_id: MatchId,
        value: Option<ScanValue>,
    ) {
        let mut table = locked(&self.matches);
        let Some(row) = table.rows.get_mut(index) else {
            return;
        };
        if row.match_id != match_id {
            return;
        }
        match value {
            Some(v) => row.value_text = v.to_string(),
            None => {
                row.valid = false;
                row.value_text = UNAVAILABLE.to_string();
            }
        }
    }

    /// Visible unlocked valid watch rows, as `(index, addr, tag, prior)`
    pub(crate) fn watch_refresh_targets(&self) -> Vec<(usize, Address, TypeTag, String)> {
        let watch = locked(&self.watch);
        let range = clamp_range(watch.visible.clone(), watch.entries.len());
        watch.entries[range.clone()]
            .iter()
            .enumerate()
            .filter(|(_, e)| e.wants_refresh() && !e.editing)
            .map(|(i, e)| (range.start + i, e.address, e.tag, e.value_text.clone()))
            .collect()
    }

    /// Locked valid watch rows, as `(addr, tag, value)`
    pub(crate) fn watch_write_back_targets(&self) -> Vec<(Address, TypeTag, String)> {
        locked(&self.watch)
            .entries
            .iter()
            .filter(|e| e.wants_write_back())
            .map(|e| (e.address, e.tag, e.value_text.clone()))
            .collect()
    }

    /// Visible valid match rows, as `(index, match_id, addr, tag, prior)`
    pub(crate) fn match_refresh_targets(&self) -> Vec<(usize, MatchId, Address, TypeTag, String)> {
        let table = locked(&self.matches);
        let range = clamp_range(table.visible.clone(), table.rows.len());
        table.rows[range.clone()]
            .iter()
            .enumerate()
            .filter(|(_, r)| r.valid)
            .map(|(i, r)| {
                (
                    range.start + i,
                    r.match_id,
                    r.address,
                    r.tag,
                    r.value_text.clone(),
                )
            })
            .collect()
    }

    pub(crate) fn set_match_count(&self, count: u64) {
        locked(&self.state).match_count = count;
    }

    // ------------------------------------------------------------------
    // cheat-list persistence

    pub fn save_cheat_list(&self, path: impl AsRef<Path>) -> ScanResult<()> {
        let file = CheatListFile {
            cheat_list: locked(&self.watch).entries.iter().map(CheatRecord::from).collect(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ScanError::CheatList(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| ScanError::CheatList(e.to_string()))
    }

    /// Loaded rows arrive unlocked and valid, appended at the end
    pub fn load_cheat_list(&self, path: impl AsRef<Path>) -> ScanResult<usize> {
        let json =
            std::fs::read_to_string(path).map_err(|e| ScanError::CheatList(e.to_string()))?;
        let file: CheatListFile =
            serde_json::from_str(&json).map_err(|e| ScanError::CheatList(e.to_string()))?;

        let mut entries = Vec::with_capacity(file.cheat_list.len());
        for record in file.cheat_list {
            entries.push(record.into_entry()?);
        }
        let count = entries.len();
        locked(&self.watch).entries.extend(entries);
        Ok(count)
    }
}

/// Reads and decodes one value through an already-acquired connection.
/// `Ok(None)` covers every unavailable case: un-sizable prior value, short
/// read, failed decode.
pub(crate) async fn read_value_with(
    conn: &mut EngineConn,
    addr: Address,
    tag: TypeTag,
    prior: &str,
) -> ScanResult<Option<ScanValue>> {
    let Some(size) = tag.read_size(prior) else {
        return Ok(None);
    };
    let bytes = conn.dump(addr, size).await?.bytes();
    if bytes.len() != size {
        return Ok(None);
    }
    Ok(ScanValue::decode(tag, &bytes))
}

fn clamp_range(visible: Option<Range<usize>>, len: usize) -> Range<usize> {
    match visible {
        Some(range) => {
            let end = range.end.min(len);
            range.start.min(end)..end
        }
        None => 0..len,
    }
}
