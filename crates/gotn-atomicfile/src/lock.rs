//! Per-key async write serialization (§5).
//!
//! Two writers targeting the same node or edge must serialize FIFO; two
//! writers targeting unrelated keys must not block each other. A single
//! workspace-wide mutex would satisfy the first property at the cost of
//! the second, so instead each key gets its own lock, looked up (and
//! lazily created) through one short-lived table lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of per-key mutexes, handed out by reference count so a guard can
/// outlive the table lookup that produced it.
#[derive(Default)]
pub struct KeyedLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Build an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, creating it if this is the first caller
    /// to ask for it. Waiters for the same key queue FIFO; unrelated keys
    /// never contend.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let key_mutex = {
            let mut table = self.table.lock().await;
            table
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        key_mutex.lock_owned().await
    }
}
