//! Canonical node/edge/graph schema, validation, and error taxonomy.
//!
//! `gotn-schema` owns the shapes every other `gotn-*` crate persists,
//! journals, or sends across the wire. It has no I/O of its own: callers
//! bring their own clock and their own storage, this crate only defines
//! what a valid document looks like and how to validate one.

pub mod edge;
pub mod error;
pub mod graph;
pub mod ids;
pub mod journal;
pub mod meta;
pub mod node;
pub mod run;
pub mod validate;

pub use edge::{Edge, EdgeType};
pub use error::{GotnError, Result, ValidationError, Violation};
pub use graph::Graph;
pub use ids::{new_internal_id, NodeId, ProjectId};
pub use journal::{JournalEntry, JournalEvent};
pub use meta::{Meta, META_SCHEMA_VERSION};
pub use node::{Artifacts, EmbeddingRef, Node, NodeStatus, Provenance};
pub use run::{Run, RunStatus};
pub use validate::{is_hard_dependency, validate_edge, validate_node};
