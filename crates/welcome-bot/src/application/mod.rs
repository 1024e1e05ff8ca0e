//! Application layer use cases for the welcome bot.
//!
//! Use cases in this layer orchestrate the domain types from `welcome-core`
//! and depend only on traits for the outside world:
//!
//! - [`welcome_service::ConfigStore`] – keyed persistence of the settings.
//! - [`welcome_service::ImageSource`] – listing of the welcome image folder.
//! - [`dispatch::EventBus`] – delivery of outbound messages.
//!
//! # Sub-modules
//!
//! - **`welcome_service`** – Owns the settings; reacts to member-join events.
//! - **`manage_settings`** – The `welcome_*` admin command handlers.
//! - **`access`**          – Decides who may run admin-only commands.
//! - **`dispatch`**        – Routes each inbound event to the right handler
//!   and sends the result over the event bus.

pub mod access;
pub mod dispatch;
pub mod manage_settings;
pub mod welcome_service;

#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessPolicy;
pub use dispatch::{BusError, Dispatcher, EventBus};
pub use welcome_service::{load_welcome_config, ConfigStore, ImageSource, StoreError, WelcomeService};
