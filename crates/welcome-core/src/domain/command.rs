//! The `welcome_*` administrative command grammar.
//!
//! Commands arrive as ordinary chat messages.  A message is a command when,
//! after trimming and removing the optional prefix (usually `/`), its first
//! whitespace-separated word is one of the command names below.  Everything
//! after that word is the argument text.
//!
//! ```text
//! welcome_enable [group_id]      welcome_disable [group_id]
//! welcome_set <message text>     welcome_show
//! welcome_image_enable           welcome_image_disable
//! welcome_status
//! ```

/// A parsed administrative command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a group to the allow-list.  `None` means "the group I am typing in".
    Enable { group_id: Option<String> },
    /// Remove a group from the allow-list.
    Disable { group_id: Option<String> },
    /// Replace the welcome text.  May be empty when the user forgot the
    /// argument; the handler answers with a usage hint in that case.
    SetMessage { text: String },
    ShowMessage,
    EnableImage,
    DisableImage,
    Status,
}

impl Command {
    /// Parses `input` into a command.
    ///
    /// Returns `None` for anything that is not a `welcome_*` command so the
    /// caller can ignore ordinary chat.
    ///
    /// # Example
    ///
    /// ```rust
    /// use welcome_core::Command;
    ///
    /// let cmd = Command::parse("/welcome_enable 2002", "/").unwrap();
    /// assert_eq!(cmd, Command::Enable { group_id: Some("2002".to_string()) });
    /// assert!(Command::parse("hello everyone", "/").is_none());
    /// ```
    pub fn parse(input: &str, prefix: &str) -> Option<Self> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix(prefix).unwrap_or(trimmed);

        let (word, rest) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], body[idx..].trim()),
            None => (body, ""),
        };

        let cmd = match word {
            "welcome_enable" => Command::Enable {
                group_id: first_arg(rest),
            },
            "welcome_disable" => Command::Disable {
                group_id: first_arg(rest),
            },
            "welcome_set" => Command::SetMessage {
                text: rest.to_string(),
            },
            "welcome_show" => Command::ShowMessage,
            "welcome_image_enable" => Command::EnableImage,
            "welcome_image_disable" => Command::DisableImage,
            "welcome_status" => Command::Status,
            _ => return None,
        };
        Some(cmd)
    }

    /// The command word, without prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Enable { .. } => "welcome_enable",
            Command::Disable { .. } => "welcome_disable",
            Command::SetMessage { .. } => "welcome_set",
            Command::ShowMessage => "welcome_show",
            Command::EnableImage => "welcome_image_enable",
            Command::DisableImage => "welcome_image_disable",
            Command::Status => "welcome_status",
        }
    }

    /// Whether the command changes settings and therefore needs an admin.
    ///
    /// `welcome_show` and `welcome_status` are open to everyone.
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Command::ShowMessage | Command::Status)
    }
}

fn first_arg(rest: &str) -> Option<String> {
    rest.split_whitespace().next().map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
