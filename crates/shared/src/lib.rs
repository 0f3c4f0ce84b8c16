//! Shared types, errors, and configuration for Coopledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorKind};
