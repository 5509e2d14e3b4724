//! Storage abstractions for rotation state.
//!
//! The rotation file is the only state carried between runs. It is read
//! wholesale at the start of a run and written wholesale at the end.
//!
//! ## File Format
//!
//! ```text
//! {
//!   "4821337": 1760000000,
//!   "5012345": 1760086400
//! }
//! ```
//!
//! Keys are listing ids, values the unix time of the last successful post.
//! No locking is done: at most one run may use a store at a time.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RotationRecords;

// Re-export for convenience
pub use local::LocalRotationStore;

/// Trait for rotation state backends.
#[async_trait]
pub trait RotationStore: Send + Sync {
    /// Load the persisted records; absent state loads as empty.
    async fn load(&self) -> Result<RotationRecords>;

    /// Replace the persisted records.
    async fn save(&self, records: &RotationRecords) -> Result<()>;
}
