// Firestore Sync - Core Library
// Exposes all modules for use in CLI, HTTP trigger, and tests

pub mod config;
pub mod error;
pub mod firestore;
pub mod record;
pub mod snapshot;
pub mod sync;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::{
    Config, DestinationConfig, Platform, ServerConfig, SourceConfig, DEFAULT_VARIABLES,
};
pub use error::{ConfigError, Result, SyncError};
pub use firestore::{FirestoreSink, RecordSink};
pub use record::{coerce_to_number, Record};
pub use snapshot::{RealtimeDbSource, Snapshot, SnapshotSource};
pub use sync::{Outcome, OutcomeKind, PassStatus, SyncExecutor, SyncReport, REASON_MISSING};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
