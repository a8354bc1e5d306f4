//! Metadata registry subsystem.
//!
//! # Data Flow
//! ```text
//! metadata_dir (YAML registries + ABI JSON)
//!     → reader.rs (load, duplicate checks, lookups)
//!     → MetadataRegistry (shared read-only via Arc)
//!
//! batch file (YAML)
//!     → batch.rs (record for the active chain)
//!     → AccountBatch (opaque call arguments)
//! ```

pub mod batch;
pub mod reader;
pub mod types;

pub use batch::AccountBatch;
pub use reader::MetadataRegistry;
pub use types::{BatchRecord, ChainRecord, ContractRecord, DeploymentRecord};
