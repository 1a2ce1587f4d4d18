//! Service façade over the graph substrate: the ten named operations, the
//! layered `Config`, process metrics, and the `BreakdownProvider` port
//! (§4.10, §4.11, §4.13, §6).

pub mod breakdown;
pub mod config;
pub mod envelope;
pub mod facade;
pub mod metrics;

pub use breakdown::{
    BreakdownMode, BreakdownProvider, BreakdownResponse, HttpBreakdownProvider, ProposedNode,
    SingleNodeBreakdownProvider,
};
pub use config::{Config, ConfigError};
pub use envelope::envelope;
pub use facade::{NodeInput, ServiceFacade};
pub use metrics::{Metrics, MetricsSnapshot};
