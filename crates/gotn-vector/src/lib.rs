//! Vector store abstraction: exact in-memory cosine search and a remote
//! ANN-backed client behind one trait object.
//!
//! Selection between the two happens once, in `gotn-service`'s
//! `ServiceFacade::new`, based on `Config`. Nothing downstream ever asks
//! "which backend am I talking to" — it holds an `Arc<dyn VectorStore>`.

pub mod memory;
pub mod remote;
pub mod store;

pub use memory::InMemoryVectorStore;
pub use remote::{RemoteConfig, RemoteVectorStore};
pub use store::{Match, VectorStore};
