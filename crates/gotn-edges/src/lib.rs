//! Hard and soft edge inference over a node set (§4.7).
//!
//! Hard inference is pure tag matching ([`hard::infer_hard_edges`]); soft
//! inference embeds and queries a vector store for mutual top-k neighbors
//! ([`soft::infer_soft_edges`]). [`EdgeEngine`] runs both and commits the
//! result through a graph store, tolerating per-edge commit failures.

pub mod engine;
pub mod hard;
pub mod soft;

pub use engine::{EdgeEngine, InferenceReport};
pub use hard::infer_hard_edges;
pub use soft::{infer_soft_edges, SoftInferenceConfig};
