//! Domain layer: welcome settings, commands and image recognition.
//!
//! Nothing in here performs I/O.  Persistence of [`config::WelcomeConfig`]
//! and listing of the image folder are the bot crate's infrastructure
//! concerns; this layer only describes the data and the rules.

pub mod command;
pub mod config;
pub mod image;
pub mod settings;

pub use command::Command;
pub use config::{AllowList, WelcomeConfig};
pub use image::is_welcome_image;
pub use settings::BotSettings;
