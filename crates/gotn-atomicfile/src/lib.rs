//! Crash-safe file writes and per-key async write serialization.
//!
//! `gotn-atomicfile` has no knowledge of the `.gotn/` layout or the
//! journal/snapshot format; it only knows how to put bytes on disk without
//! ever leaving a torn or half-renamed file behind, and how to make sure
//! two concurrent writers to the same logical key queue up FIFO.

pub mod lock;
pub mod write;

pub use lock::KeyedLocks;
pub use write::{append_and_sync, append_and_sync_async, atomic_write, atomic_write_async};
