//! Infrastructure layer for the welcome bot.
//!
//! Contains the outward-facing adapters: the TOML config store, the image
//! folder on disk and the OneBot WebSocket client.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `welcome_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod image_folder;
pub mod onebot;
pub mod storage;
