//! Workspace-scoped graph store: snapshot + journal + per-key locking.
//!
//! `gotn-graph-store` is the only crate that knows the `.gotn/` directory
//! layout. It composes [`gotn_atomicfile`]'s locks and atomic writer with
//! [`gotn_journal`]'s append/replay to give every other crate a single
//! `GraphStore` handle with read/write/recover operations that can never
//! observe a torn snapshot or an out-of-order journal.

pub mod paths;
pub mod store;

pub use paths::WorkspaceLayout;
pub use store::{GraphStore, Integrity, RecoverReport};
