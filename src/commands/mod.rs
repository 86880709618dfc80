//! Command implementations for the CLI
//!
//! - agent: serve host agent requests
//! - manual: one-off request from a terminal
//! - config: configuration display and validation

pub mod agent;
pub mod config;
pub mod manual;
