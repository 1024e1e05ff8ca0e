//! WelcomeService: owns the welcome settings and greets new members.
//!
//! This is the heart of the bot.  It holds the only in-memory copy of the
//! [`WelcomeConfig`] together with the [`ConfigStore`] it was loaded from,
//! and reacts to member-join events by building the welcome message.
//!
//! # Concurrency
//!
//! The tokio runtime may run several event handlers at once.  The config and
//! the store therefore sit behind a single async `Mutex`, and every
//! read-modify-persist sequence in `manage_settings` holds that lock from the
//! first read until `save()` returns.  Two concurrent `welcome_enable`
//! commands can never lose each other's update.
//!
//! # Image selection
//!
//! The image folder is listed on every qualifying event; there is no cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use welcome_core::domain::config::{
    KEY_ENABLED_GROUPS, KEY_ENABLE_IMAGE, KEY_IMAGE_FOLDER, KEY_WELCOME_MESSAGE,
};
use welcome_core::{
    InboundEvent, MemberJoined, MessageChain, OutboundMessage, ReplyTarget, Segment,
    WelcomeConfig,
};

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Error type for configuration store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The value cannot be represented in the store's format.
    #[error("value for '{key}' cannot be stored: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Writing the durable copy failed.
    #[error("failed to persist configuration: {0}")]
    Save(String),
}

/// Keyed persistence of the welcome settings.
///
/// `set` only changes the store's pending state; nothing is durable until
/// `save` returns `Ok`.  The infrastructure implementation is a TOML file.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore: Send {
    /// Returns the stored value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> Option<Value>;

    /// Replaces the value for `key`.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Writes all pending values to durable storage.
    fn save(&mut self) -> Result<(), StoreError>;
}

/// The folder welcome images are picked from.
pub trait ImageSource: Send + Sync {
    /// Absolute path of the folder, for status output and log messages.
    fn location(&self) -> &Path;

    /// Absolute paths of all qualifying image files currently in the folder.
    fn list_images(&self) -> std::io::Result<Vec<PathBuf>>;
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Reads the four welcome settings from `store`, falling back to the default
/// for each key that is absent or holds a value of the wrong type.
pub fn load_welcome_config(store: &dyn ConfigStore) -> WelcomeConfig {
    let defaults = WelcomeConfig::default();
    WelcomeConfig {
        enabled_groups: read_key(store, KEY_ENABLED_GROUPS).unwrap_or(defaults.enabled_groups),
        welcome_message: read_key(store, KEY_WELCOME_MESSAGE)
            .unwrap_or(defaults.welcome_message),
        enable_image: read_key(store, KEY_ENABLE_IMAGE).unwrap_or(defaults.enable_image),
        image_folder: read_key(store, KEY_IMAGE_FOLDER).unwrap_or(defaults.image_folder),
    }
}

fn read_key<T: DeserializeOwned>(store: &dyn ConfigStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("ignoring invalid '{key}' in config store: {e}");
            None
        }
    }
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Settings plus the store that persists them, guarded together.
pub(crate) struct ServiceState {
    pub(crate) config: WelcomeConfig,
    store: Box<dyn ConfigStore>,
}

impl ServiceState {
    /// Writes one key and saves.  On error the in-memory config is already
    /// updated and may be ahead of the durable copy.
    pub(crate) fn persist(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.store.set(key, value)?;
        self.store.save()
    }

    fn persist_all(&mut self) -> Result<(), StoreError> {
        let cfg = &self.config;
        let entries = [
            (KEY_ENABLED_GROUPS, Value::from(cfg.enabled_groups.to_vec())),
            (KEY_WELCOME_MESSAGE, Value::from(cfg.welcome_message.clone())),
            (KEY_ENABLE_IMAGE, Value::from(cfg.enable_image)),
            (KEY_IMAGE_FOLDER, Value::from(cfg.image_folder.clone())),
        ];
        for (key, value) in entries {
            self.store.set(key, value)?;
        }
        self.store.save()
    }
}

/// The welcome use case.
pub struct WelcomeService {
    state: Mutex<ServiceState>,
    images: Arc<dyn ImageSource>,
}

impl WelcomeService {
    /// Creates the service from an already-loaded config and its store.
    ///
    /// The image folder must already exist; see
    /// `infrastructure::image_folder::ImageFolder::ensure`.
    pub fn new(
        config: WelcomeConfig,
        store: Box<dyn ConfigStore>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        info!(
            "welcome service loaded, enabled groups: {:?}",
            config.enabled_groups.to_vec()
        );
        Self {
            state: Mutex::new(ServiceState { config, store }),
            images,
        }
    }

    /// Loads the config from `store` and creates the service.
    pub fn load(store: Box<dyn ConfigStore>, images: Arc<dyn ImageSource>) -> Self {
        let config = load_welcome_config(store.as_ref());
        Self::new(config, store, images)
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().await
    }

    /// A snapshot of the current settings.
    pub async fn config(&self) -> WelcomeConfig {
        self.state.lock().await.config.clone()
    }

    pub fn image_folder(&self) -> &Path {
        self.images.location()
    }

    /// Reacts to an arbitrary inbound event.
    ///
    /// Returns the welcome message for a member-join notice in an enabled
    /// group and `None` for everything else.  Never fails: malformed events
    /// are simply not matching events.
    pub async fn handle_event(&self, event: &Value) -> Option<OutboundMessage> {
        match InboundEvent::classify(event) {
            InboundEvent::MemberJoined(joined) => self.greet(&joined).await,
            _ => None,
        }
    }

    /// Builds the welcome message for `joined`, or `None` if the group is
    /// not on the allow-list.
    ///
    /// The message is `[mention, " " + text]`, followed by one random image
    /// when image welcome is on and the folder has any.  A missing image is
    /// logged and the message goes out without it.
    pub async fn greet(&self, joined: &MemberJoined) -> Option<OutboundMessage> {
        info!(
            "member joined: group {}, user {}",
            joined.group_id, joined.user_id
        );

        let (text, with_image) = {
            let state = self.state.lock().await;
            if !state.config.enabled_groups.contains(&joined.group_id) {
                debug!("group {} is not enabled; no welcome", joined.group_id);
                return None;
            }
            (state.config.welcome_message.clone(), state.config.enable_image)
        };

        let mut chain = MessageChain::new();
        chain.push(Segment::mention(joined.user_id.as_str()));
        chain.push(Segment::text(format!(" {text}")));

        if with_image {
            match self.pick_image() {
                Some(path) => chain.push(Segment::image(path)),
                None => warn!(
                    "no welcome image available in {}",
                    self.images.location().display()
                ),
            }
        }

        Some(OutboundMessage::new(
            ReplyTarget::Group(joined.group_id.clone()),
            chain,
        ))
    }

    /// Picks one qualifying image uniformly at random.
    ///
    /// A folder that cannot be read counts as empty.
    pub fn pick_image(&self) -> Option<PathBuf> {
        match self.images.list_images() {
            Ok(images) => images.choose(&mut rand::thread_rng()).cloned(),
            Err(e) => {
                warn!(
                    "failed to read image folder {}: {e}",
                    self.images.location().display()
                );
                None
            }
        }
    }

    /// Live count of qualifying images.
    pub fn image_count(&self) -> std::io::Result<usize> {
        self.images.list_images().map(|images| images.len())
    }

    /// Saves every setting once more.  Called when the bot shuts down.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.persist_all()?;
        info!("welcome service unloaded");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
