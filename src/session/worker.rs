//! Live watch worker and progress ticker
//!
//! Two named tickers run on independent timers and are toggled exactly on
//! the `Scanning`↔other phase transitions: the progress ticker polls scan
//! progress while a scan runs, the watch ticker keeps locked entries
//! written and visible rows fresh the rest of the time. An inactive ticker
//! wakes and does nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::controller::{read_value_with, Session};
use crate::core::types::{ScanError, ScanResult};

/// What a single watch tick ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Serializer was busy; the whole tick was dropped, zero engine calls
    Skipped,
    /// Nothing attached
    NoProcess,
    /// Normal pass
    Refreshed { written: usize, refreshed: usize },
}

/// One pass of the live watch worker.
///
/// Ordering within a tick is fixed: liveness first, then every locked
/// write-back, then the visible-row reads. Locked entries are never read
/// back; rows under interactive edit are never overwritten.
pub async fn watch_tick(session: &Session) -> ScanResult<TickOutcome> {
    // backpressure by dropping: busy means no work at all this tick
    let Some(mut conn) = session.serializer().try_acquire() else {
        return Ok(TickOutcome::Skipped);
    };

    let pid = session.state_snapshot().pid;
    if pid == 0 {
        return Ok(TickOutcome::NoProcess);
    }

    let reply = conn.info(pid).await?;
    if reply.is_process_dead {
        drop(conn);
        session.handle_process_gone(pid);
        return Err(ScanError::ProcessGone(pid));
    }
    session.set_match_count(reply.found);

    // write-back pass: locked entries are authoritative
    let write_backs = session.watch_write_back_targets();
    let written = write_backs.len();
    for (addr, tag, value) in write_backs {
        conn.write(tag, addr, &value).await?;
    }

    // read-forward pass, watch rows first, then match rows
    let mut refreshed = 0usize;
    for (index, addr, tag, prior) in session.watch_refresh_targets() {
        let value = read_value_with(&mut conn, addr, tag, &prior).await?;
        session.apply_watch_refresh(index, addr, value);
        refreshed += 1;
    }
    for (index, match_id, addr, tag, prior) in session.match_refresh_targets() {
        let value = read_value_with(&mut conn, addr, tag, &prior).await?;
        session.apply_match_refresh(index, match_id, value);
        refreshed += 1;
    }

    Ok(TickOutcome::Refreshed { written, refreshed })
}

/// Handles to the two background tickers
pub struct WorkerHandles {
    pub watch: JoinHandle<()>,
    pub progress: JoinHandle<()>,
}

impl WorkerHandles {
    pub fn abort(&self) {
        self.watch.abort();
        self.progress.abort();
    }
}

/// Spawns both tickers; they exit on a fatal error or once the session
/// reaches `Exiting`.
pub fn spawn_workers(
    session: Arc<Session>,
    watch_interval: Duration,
    progress_interval: Duration,
) -> WorkerHandles {
    let watch = tokio::spawn(run_watch_ticker(session.clone(), watch_interval));
    let progress = tokio::spawn(run_progress_ticker(session, progress_interval));
    WorkerHandles { watch, progress }
}

async fn run_watch_ticker(session: Arc<Session>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if session.phase() == crate::session::state::ScanPhase::Exiting {
            break;
        }
        if !session.watch_ticker_active() {
            continue;
        }
        match watch_tick(&session).await {
            Ok(TickOutcome::Refreshed { written, refreshed }) if written + refreshed > 0 => {
                debug!(written, refreshed, "watch tick");
            }
            Ok(_) => {}
            Err(err) if err.is_fatal() => {
                warn!(error = %err, "watch ticker stopping on transport loss");
                break;
            }
            Err(err) => warn!(error = %err, "watch tick failed"),
        }
    }
}

async fn run_progress_ticker(session: Arc<Session>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if session.phase() == crate::session::state::ScanPhase::Exiting {
            break;
        }
        if !session.progress_ticker_active() {
            continue;
        }
        match session.poll_progress().await {
            Ok(Some(progress)) => debug!(progress, "scan progress"),
            Ok(None) => {}
            Err(err) if err.is_fatal() => {
                warn!(error = %err, "progress ticker stopping on transport loss");
                break;
            }
            Err(err) => warn!(error = %err, "progress poll failed"),
        }
    }
}
