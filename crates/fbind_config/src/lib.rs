//! Parsing and validation of `fbind.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`ProjectConfig`] holding the module map, the build directory, and the
//! toolchain settings, plus the resolution of those settings into a concrete
//! [`Toolchain`] for the current host.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{builtin_toolchain, resolve_toolchain, ResolvedToolchain, ToolchainOrigin};
pub use types::*;
