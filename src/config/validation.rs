//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, fee caps ordered)
//! - Check that per-chain keys are chain ids and override URLs parse
//!
//! Returns all validation errors, not just the first.

use std::fmt;

use crate::blockchain::builder::FeePolicy;
use crate::config::schema::DispatchConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.registry.metadata_dir.trim().is_empty() {
        errors.push(ValidationError::new("registry.metadata_dir", "must not be empty"));
    }
    if config.registry.load_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "registry.load_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.rpc.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "rpc.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    validate_fee_policy("fees.default", &config.fees.default, &mut errors);
    for (key, policy) in &config.fees.chains {
        let field = format!("fees.chains.{}", key);
        check_chain_key(&field, key, &mut errors);
        validate_fee_policy(&field, policy, &mut errors);
    }

    for (key, endpoint) in &config.rpc.endpoint_overrides {
        let field = format!("rpc.endpoint_overrides.{}", key);
        check_chain_key(&field, key, &mut errors);
        if let Err(e) = endpoint.parse::<url::Url>() {
            errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", endpoint, e)));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_chain_key(field: &str, key: &str, errors: &mut Vec<ValidationError>) {
    match key.parse::<u64>() {
        Ok(0) => errors.push(ValidationError::new(field, "chain id must be non-zero")),
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::new(field, "key must be a chain id")),
    }
}

fn validate_fee_policy(field: &str, policy: &FeePolicy, errors: &mut Vec<ValidationError>) {
    if policy.gas_limit == 0 {
        errors.push(ValidationError::new(
            format!("{}.gas_limit", field),
            "must be greater than 0",
        ));
    }
    if policy.max_priority_fee_per_gas > policy.max_fee_per_gas {
        errors.push(ValidationError::new(
            format!("{}.max_priority_fee_per_gas", field),
            "must not exceed max_fee_per_gas",
        ));
    }
}
