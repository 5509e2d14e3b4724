//! Pipeline entry points.
//!
//! - `run_rotation`: Discover → Prune → Select → {Enrich → Compose → Publish → Record}* → Persist

pub mod rotate;

pub use rotate::{Collaborators, RunOptions, RunReport, run_rotation};
