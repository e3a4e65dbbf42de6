pub mod registry;
pub mod types;

pub use registry::{RegistryError, SnoozeRegistry};
pub use types::{sort_by_notify_at, urls_overlap, SnoozeRecord};
