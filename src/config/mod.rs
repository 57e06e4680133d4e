//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, ListenConfig, AuthConfig, ...)
//! - [`defaults`]: serde default values
//! - [`validation`]: startup checks that collect every problem at once

mod defaults;
mod types;
mod validation;

pub use types::Config;
pub use validation::validate;
