//! Tolerant extraction of the events the bot reacts to.
//!
//! The platform delivers many event kinds over one channel: chat messages,
//! notices (joins, leaves, recalls...), meta events (heartbeats) and API
//! responses.  Only two shapes matter here:
//!
//! ```json
//! {"post_type":"notice","notice_type":"group_increase","group_id":1001,"user_id":555}
//! {"post_type":"message","message_type":"group","group_id":1001,"user_id":42,
//!  "raw_message":"/welcome_status","sender":{"role":"admin"}}
//! ```
//!
//! A missing or ill-typed field is never an error: the event is simply
//! classified as [`InboundEvent::Other`].
//!
//! # Identifiers
//!
//! Group and user identifiers are opaque strings.  The platform usually sends
//! them as JSON integers; they are converted to their decimal text.  String
//! identifiers are taken verbatim, so `"0123"` and `123` stay distinct.

use serde_json::Value;

/// A member joined a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberJoined {
    pub group_id: String,
    pub user_id: String,
}

impl MemberJoined {
    /// Extracts a join notice, or `None` for any other event shape.
    pub fn from_event(event: &Value) -> Option<Self> {
        if str_field(event, "post_type")? != "notice"
            || str_field(event, "notice_type")? != "group_increase"
        {
            return None;
        }
        Some(Self {
            group_id: id_field(event, "group_id")?,
            user_id: id_field(event, "user_id")?,
        })
    }
}

/// The sender's standing in the group the message was sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRole {
    Owner,
    Admin,
    Member,
    /// Private chats and platforms that omit `sender.role`.
    Unknown,
}

impl SenderRole {
    fn parse(role: &str) -> Self {
        match role {
            "owner" => SenderRole::Owner,
            "admin" => SenderRole::Admin,
            "member" => SenderRole::Member,
            _ => SenderRole::Unknown,
        }
    }

    /// Group owners and group admins may manage the bot in their group.
    pub fn is_group_admin(self) -> bool {
        matches!(self, SenderRole::Owner | SenderRole::Admin)
    }
}

/// A chat message that may carry a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Originating group; `None` for private messages.
    pub group_id: Option<String>,
    pub user_id: String,
    pub role: SenderRole,
    /// Plain text of the message.
    pub text: String,
}

impl ChatMessage {
    /// Extracts a chat message, or `None` for any other event shape.
    pub fn from_event(event: &Value) -> Option<Self> {
        if str_field(event, "post_type")? != "message" {
            return None;
        }
        let group_id = match str_field(event, "message_type") {
            Some("group") => Some(id_field(event, "group_id")?),
            _ => None,
        };
        let role = event
            .get("sender")
            .and_then(|s| s.get("role"))
            .and_then(Value::as_str)
            .map(SenderRole::parse)
            .unwrap_or(SenderRole::Unknown);

        Some(Self {
            group_id,
            user_id: id_field(event, "user_id")?,
            role,
            text: message_text(event)?,
        })
    }
}

/// Classification of a raw inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    MemberJoined(MemberJoined),
    Message(ChatMessage),
    /// Anything else: heartbeats, other notices, API responses, garbage.
    Other,
}

impl InboundEvent {
    pub fn classify(event: &Value) -> Self {
        if let Some(joined) = MemberJoined::from_event(event) {
            return InboundEvent::MemberJoined(joined);
        }
        if let Some(message) = ChatMessage::from_event(event) {
            return InboundEvent::Message(message);
        }
        InboundEvent::Other
    }
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn str_field<'a>(event: &'a Value, key: &str) -> Option<&'a str> {
    event.get(key)?.as_str()
}

/// Reads an identifier given either as a JSON integer or a non-empty string.
fn id_field(event: &Value, key: &str) -> Option<String> {
    match event.get(key)? {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Plain text of a message event.
///
/// Prefers `raw_message`; falls back to `message` given as a string or as an
/// array of segments, in which case the `text` segments are concatenated.
fn message_text(event: &Value) -> Option<String> {
    if let Some(raw) = str_field(event, "raw_message") {
        return Some(raw.to_string());
    }
    match event.get("message")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(segments) => Some(
            segments
                .iter()
                .filter(|seg| seg.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|seg| seg.get("data")?.get("text")?.as_str())
                .collect(),
        ),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
