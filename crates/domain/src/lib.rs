//! Shared types for the resuse workspace: the error taxonomy and the
//! TOML-backed configuration sections.

pub mod config;
pub mod error;

pub use error::{Error, Result};
