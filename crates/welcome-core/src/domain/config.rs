//! Welcome settings and the group allow-list.
//!
//! [`WelcomeConfig`] is the in-memory copy of the four persisted settings.
//! It is owned by exactly one service instance for the lifetime of the
//! process; the configuration store owns the durable copy.
//!
//! # Persisted keys
//!
//! | Key               | Type             | Default              |
//! |-------------------|------------------|----------------------|
//! | `enabled_groups`  | array of strings | empty                |
//! | `welcome_message` | string           | `欢迎新成员加入群聊` |
//! | `enable_image`    | bool             | `true`               |
//! | `image_folder`    | string           | `welcome_images`     |

use serde::{Deserialize, Deserializer, Serialize};

/// Store key for the allow-list.
pub const KEY_ENABLED_GROUPS: &str = "enabled_groups";
/// Store key for the welcome text.
pub const KEY_WELCOME_MESSAGE: &str = "welcome_message";
/// Store key for the image-welcome toggle.
pub const KEY_ENABLE_IMAGE: &str = "enable_image";
/// Store key for the image folder, relative to the bot's base directory.
pub const KEY_IMAGE_FOLDER: &str = "image_folder";

/// Welcome text used until an administrator sets one.
pub const DEFAULT_WELCOME_MESSAGE: &str = "欢迎新成员加入群聊";
/// Image folder name used when the store has none.
pub const DEFAULT_IMAGE_FOLDER: &str = "welcome_images";

// ── AllowList ─────────────────────────────────────────────────────────────────

/// The set of group identifiers for which welcome messages are enabled.
///
/// Backed by a `Vec` so the persisted order matches the order in which groups
/// were enabled, but every insertion path rejects duplicates: a group appears
/// at most once no matter how the list was built.
///
/// Identifiers are opaque strings.  When deserialising, integer entries (as
/// written by hand into a config file) are accepted and converted to their
/// decimal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowList(Vec<String>);

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from arbitrary identifiers, dropping duplicates and
    /// blank entries while keeping first-seen order.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for id in ids {
            list.insert(id);
        }
        list
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.0.iter().any(|g| g == group_id)
    }

    /// Adds `group_id`.  Returns `false` if it was already present (or blank).
    pub fn insert(&mut self, group_id: impl Into<String>) -> bool {
        let group_id = group_id.into();
        if group_id.trim().is_empty() || self.contains(&group_id) {
            return false;
        }
        self.0.push(group_id);
        true
    }

    /// Removes `group_id`.  Returns `false` if it was not present.
    pub fn remove(&mut self, group_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|g| g != group_id);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// One allow-list entry as it may appear in a config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupId {
    Text(String),
    Number(i64),
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<RawGroupId>::deserialize(deserializer)?;
        Ok(Self::from_ids(raw.into_iter().map(|id| match id {
            RawGroupId::Text(s) => s,
            RawGroupId::Number(n) => n.to_string(),
        })))
    }
}

// ── WelcomeConfig ─────────────────────────────────────────────────────────────

/// All persisted welcome settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeConfig {
    /// Groups that receive a welcome message.
    pub enabled_groups: AllowList,
    /// Text appended after the mention.  May span several lines.
    pub welcome_message: String,
    /// Whether a random image from the image folder is attached.
    pub enable_image: bool,
    /// Image folder path component, resolved against the bot's base directory
    /// once at startup.
    pub image_folder: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            enabled_groups: AllowList::new(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            enable_image: true,
            image_folder: DEFAULT_IMAGE_FOLDER.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
