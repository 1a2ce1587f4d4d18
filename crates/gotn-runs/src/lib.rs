//! Run directory materialization, step recording, and node execution
//! (§4.8 step 6, §4.10).

pub mod directory;
pub mod execute;
pub mod patch;
pub mod steps;

pub use directory::{latest_run_dir, RunDirectory};
pub use execute::{execute_node, ExecutionOutcome};
pub use patch::write_patch_stub;
pub use steps::{append_step, StepRecord};
