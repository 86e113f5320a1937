// src/config/mod.rs

//! TOML configuration: `model` holds the serde types, `loader` reads files
//! and `validate` turns a `RawConfigFile` into a checked `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile, RunnerSection, ServerConfig, ServerSection};
