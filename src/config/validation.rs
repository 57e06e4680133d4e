//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Placeholder token shipped in the sample config.
const PLACEHOLDER_TOKEN: &str = "changeme";

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("auth.token is required (or set ENDPOINT_AUTH)")]
    MissingAuthToken,
    #[error("auth.token is still the placeholder value")]
    PlaceholderAuthToken,
    #[error("events.known contains an empty name")]
    EmptyEventName,
    #[error("events.known lists {0} more than once")]
    DuplicateEvent(String),
    #[error("schema.path does not exist: {0}")]
    SchemaNotFound(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    // Auth
    if config.auth.token.is_empty() {
        errors.push(ValidationError::MissingAuthToken);
    } else if config.auth.token == PLACEHOLDER_TOKEN {
        errors.push(ValidationError::PlaceholderAuthToken);
    }

    // Event catalog
    let mut seen = HashSet::new();
    for event in &config.events.known {
        if event.is_empty() {
            errors.push(ValidationError::EmptyEventName);
        } else if !seen.insert(event.as_str()) {
            errors.push(ValidationError::DuplicateEvent(event.clone()));
        }
    }

    // Schema file
    if let Some(ref path) = config.schema.path
        && !Path::new(path).exists()
    {
        errors.push(ValidationError::SchemaNotFound(path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
