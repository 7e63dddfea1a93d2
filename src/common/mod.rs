//! # Common Components
//!
//! Shared utilities used by the server and the CLI.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration and context construction
//! - [`device`]: device identifier derivation

pub mod config;
pub mod device;
