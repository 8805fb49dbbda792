//! Configuration and profile management
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Settings reach the client factory as an explicit [`Settings`] value. They
//! can be built by hand, from environment variables alone, or from a named
//! profile in a TOML file with environment overrides layered on top.
//!
//! # Features
//!
//! - Multiple named profiles (one per subscription / environment)
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations
//! - Public, China and US Government clouds

pub mod config;
pub mod credential;
pub mod error;
pub mod poll;
pub mod settings;

// Re-export main types for convenience
pub use config::{CloudEnvironment, Config, Profile, ProfileCredentials};
pub use credential::CredentialStore;
pub use error::{ConfigError, Result};
pub use poll::PollConfig;
pub use settings::{CredentialSource, Settings};
