//! Simulated hosts and the registry that owns them.

pub mod registry;
pub mod types;

// Re-export commonly used types
pub use registry::{HostError, HostRegistry, DEFAULT_SERVER_ADDRESS};
pub use types::{Host, HostId, HostSnapshot, OsVariant, SERVER_ID};
