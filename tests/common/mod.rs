//! Integration test common infrastructure.
//!
//! Provides utilities for spawning test servers and sending authorized
//! ingest requests to them.

pub mod server;

#[allow(unused_imports)]
pub use server::{TEST_TOKEN, TestServer};
