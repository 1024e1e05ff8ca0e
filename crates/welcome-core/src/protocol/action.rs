//! Outbound message envelope and its OneBot action form.
//!
//! Identifiers are opaque strings inside the bot.  On the wire, OneBot
//! implementations expect `group_id`/`user_id` as integers, so an identifier
//! is sent as a JSON number only when it is the canonical decimal form of an
//! integer; anything else (leading zeros, non-digits) is sent verbatim as a
//! string.

use serde_json::{json, Value};

use super::segment::MessageChain;

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    Group(String),
    Private(String),
}

/// A message ready to be handed to the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub target: ReplyTarget,
    pub chain: MessageChain,
}

impl OutboundMessage {
    pub fn new(target: ReplyTarget, chain: MessageChain) -> Self {
        Self { target, chain }
    }

    /// Renders the `send_group_msg` / `send_private_msg` action.
    ///
    /// `echo` is returned verbatim by the platform in the API response and
    /// lets failures be correlated in the logs.
    pub fn to_action(&self, echo: &str) -> Value {
        let message = self.chain.to_onebot();
        match &self.target {
            ReplyTarget::Group(group_id) => json!({
                "action": "send_group_msg",
                "params": {"group_id": wire_id(group_id), "message": message},
                "echo": echo,
            }),
            ReplyTarget::Private(user_id) => json!({
                "action": "send_private_msg",
                "params": {"user_id": wire_id(user_id), "message": message},
                "echo": echo,
            }),
        }
    }
}

fn wire_id(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => Value::from(n),
        _ => Value::String(id.to_string()),
    }
}
