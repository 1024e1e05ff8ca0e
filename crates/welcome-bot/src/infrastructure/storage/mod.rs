//! Storage infrastructure: the keyed TOML config store.
//!
//! The application only sees the [`ConfigStore`](crate::application::ConfigStore)
//! trait; `config` implements it on top of a single TOML file whose top-level
//! keys are the setting names.

pub mod config;

pub use config::{ConfigError, TomlConfigStore};
