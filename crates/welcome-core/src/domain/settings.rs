//! Process-level bot settings.
//!
//! [`BotSettings`] holds everything the binary needs to start: where the
//! OneBot endpoint is, where the configuration file lives, who the superusers
//! are.  It is populated from CLI arguments and environment variables by the
//! binary; this module never reads the environment itself.
//!
//! These settings are distinct from the persisted [`WelcomeConfig`], which
//! administrators change at runtime through chat commands.
//!
//! [`WelcomeConfig`]: crate::domain::config::WelcomeConfig

use std::path::{Path, PathBuf};
use std::time::Duration;

/// All runtime settings for the welcome bot process.
///
/// # Example
///
/// ```rust
/// use welcome_core::BotSettings;
///
/// let settings = BotSettings::default();
/// assert_eq!(settings.ws_url, "ws://127.0.0.1:3001");
/// assert_eq!(settings.command_prefix, "/");
/// ```
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// OneBot v11 forward WebSocket endpoint.
    pub ws_url: String,

    /// Optional access token sent as `Authorization: Bearer <token>`.
    pub access_token: Option<String>,

    /// Path of the TOML file holding the persisted welcome settings.
    pub config_path: PathBuf,

    /// Directory the image folder is resolved against.
    ///
    /// `None` means "the directory containing the config file".
    pub base_dir: Option<PathBuf>,

    /// User identifiers allowed to run admin commands in any group and in
    /// private chat.
    pub superusers: Vec<String>,

    /// Prefix in front of command words (`/welcome_status`).  May be empty.
    pub command_prefix: String,

    /// Delay between reconnection attempts after the WebSocket drops.
    pub reconnect_interval: Duration,
}

impl BotSettings {
    /// The directory the `image_folder` setting is relative to.
    pub fn image_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => match self.config_path.parent() {
                Some(parent) if parent != Path::new("") => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }
}

impl Default for BotSettings {
    /// | Field              | Default                |
    /// |--------------------|------------------------|
    /// | ws_url             | `ws://127.0.0.1:3001`  |
    /// | access_token       | none                   |
    /// | config_path        | `welcome.toml`         |
    /// | base_dir           | config file directory  |
    /// | superusers         | none                   |
    /// | command_prefix     | `/`                    |
    /// | reconnect_interval | 5 seconds              |
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:3001".to_string(),
            access_token: None,
            config_path: PathBuf::from("welcome.toml"),
            base_dir: None,
            superusers: Vec::new(),
            command_prefix: "/".to_string(),
            reconnect_interval: Duration::from_secs(5),
        }
    }
}
