//! Who may run which command.
//!
//! | Command                                 | Allowed                                   |
//! |-----------------------------------------|-------------------------------------------|
//! | `welcome_show`, `welcome_status`        | everyone                                  |
//! | `welcome_enable`, `welcome_disable`     | superusers; group owner/admin for the group they are typing in |
//! | `welcome_set`, `welcome_image_*`        | superusers only                           |
//!
//! The welcome text and the image toggle are shared by every enabled group,
//! so a group role never authorizes changing them.

use std::collections::HashSet;

use welcome_core::{ChatMessage, Command};

pub const PERMISSION_DENIED: &str = "权限不足，仅管理员可使用此命令";

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    superusers: HashSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(superusers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            superusers: superusers
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_superuser(&self, user_id: &str) -> bool {
        self.superusers.contains(user_id)
    }

    /// Returns `true` if `message`'s sender may run `command`.
    pub fn permits(&self, command: &Command, message: &ChatMessage) -> bool {
        if !command.requires_admin() || self.is_superuser(&message.user_id) {
            return true;
        }
        match command {
            Command::Enable { group_id } | Command::Disable { group_id } => {
                message.role.is_group_admin() && targets_own_group(group_id.as_deref(), message)
            }
            _ => false,
        }
    }
}

/// Whether the group a command acts on is the group it was typed in.
fn targets_own_group(explicit: Option<&str>, message: &ChatMessage) -> bool {
    let Some(origin) = message.group_id.as_deref() else {
        return false;
    };
    match explicit.map(str::trim).filter(|g| !g.is_empty()) {
        Some(target) => target == origin,
        None => true,
    }
}
