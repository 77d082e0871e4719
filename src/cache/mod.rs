pub mod inflight;
pub mod store;

pub use inflight::{InflightLease, InflightLocks};
pub use store::{ArtifactStore, StoreError};
