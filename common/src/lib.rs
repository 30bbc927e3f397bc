//! Shared utilities for provisioning components
//!
//! This crate provides common functionality used across components:
//! - Structured logging initialization
//! - Environment variable and `.env` parsing helpers
//! - Command execution utilities

pub mod command;
pub mod config;
pub mod logging;

pub use command::{CommandResult, CommandRunner, ExecError, Invocation, SystemRunner};
pub use config::{load_env_file, ConfigExt};
pub use logging::{init_logging, LogFormat};
