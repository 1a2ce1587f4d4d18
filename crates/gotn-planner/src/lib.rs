//! Plan composition: selects nodes, restricts to `hard_requires` edges,
//! layers them with Kahn's algorithm and a soft-weight tie-break, and
//! materializes a run directory (§4.8).

pub mod compose;
pub mod layering;
pub mod selection;

pub use compose::{compose_plan, ComposedPlan, PlanCriteria, PlanRecord};
pub use layering::layer;
pub use selection::{select_nodes, soft_weights};
