//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod export;
pub mod schedule;
pub mod validate;
