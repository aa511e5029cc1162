//! Single-flight gate on the engine connection
//!
//! The engine accepts one in-flight request at a time, so the connection
//! lives behind a mutex. User-initiated operations acquire blocking and
//! always complete; background ticks acquire non-blocking and skip the
//! whole tick when busy — dropped work, never queued work.
//!
//! Nested use within one logical operation is expressed by passing the
//! acquired guard (a `&mut EngineConn`) down the call chain, so the
//! single-flight invariant is enforced by the borrow checker rather than a
//! reentrant lock.

use super::conn::EngineConn;
use tokio::sync::{Mutex, MutexGuard};

pub type EngineGuard<'a> = MutexGuard<'a, EngineConn>;

pub struct CommandSerializer {
    inner: Mutex<EngineConn>,
}

impl CommandSerializer {
    pub fn new(conn: EngineConn) -> Self {
        CommandSerializer {
            inner: Mutex::new(conn),
        }
    }

    /// Blocking acquisition, for user-triggered actions
    pub async fn acquire(&self) -> EngineGuard<'_> {
        self.inner.lock().await
    }

    /// Non-blocking acquisition, for background ticks. `None` means the
    /// caller skips its entire tick with zero engine calls.
    pub fn try_acquire(&self) -> Option<EngineGuard<'_>> {
        self.inner.try_lock().ok()
    }
}
