//! `daybook-core`: configuration and shared error types for the daybook workspace.

pub mod config;
pub mod error;

pub use config::DaybookConfig;
pub use error::{CoreError, Result};
