//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → registry load, fee policy lookup, RPC client timeouts
//! ```
//!
//! All fields have defaults, so a missing config file means
//! `DispatchConfig::default()`.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::DispatchConfig;
pub use schema::FeeConfig;
pub use schema::ObservabilityConfig;
pub use schema::RegistryConfig;
pub use schema::RpcConfig;
