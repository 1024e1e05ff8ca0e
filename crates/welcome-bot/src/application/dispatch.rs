//! Dispatcher: routes each inbound event to the handler that cares about it.
//!
//! ```text
//! raw event ──► WelcomeService::handle_event ──► welcome message ──┐
//!          └──► ChatMessage ─► Command::parse ─► AccessPolicy ─► execute ─► reply ──► EventBus
//! ```
//!
//! Join notices produce at most one welcome message; chat messages produce at
//! most one command reply.  Everything else is dropped silently.  Delivery
//! failures are logged and never propagate back to the connection loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use welcome_core::{ChatMessage, Command, MessageChain, OutboundMessage, ReplyTarget};

use super::access::{AccessPolicy, PERMISSION_DENIED};
use super::welcome_service::WelcomeService;

/// Error type for outbound delivery.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("event bus is closed")]
    Closed,
    #[error("failed to encode outbound action: {0}")]
    Encode(String),
}

/// Delivers outbound messages to the chat platform.
///
/// The infrastructure implementation feeds the WebSocket writer task; test
/// implementations record what was sent.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<(), BusError>;
}

pub struct Dispatcher {
    service: Arc<WelcomeService>,
    access: AccessPolicy,
    prefix: String,
    bus: Arc<dyn EventBus>,
}

impl Dispatcher {
    pub fn new(
        service: Arc<WelcomeService>,
        access: AccessPolicy,
        prefix: impl Into<String>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            service,
            access,
            prefix: prefix.into(),
            bus,
        }
    }

    pub fn service(&self) -> &Arc<WelcomeService> {
        &self.service
    }

    /// Handles one inbound event end to end.
    pub async fn dispatch(&self, event: &Value) {
        if let Some(welcome) = self.service.handle_event(event).await {
            self.deliver(welcome).await;
            return;
        }

        let Some(message) = ChatMessage::from_event(event) else {
            return;
        };
        if let Some(reply) = self.run_command(&message).await {
            self.deliver(reply).await;
        }
    }

    /// Parses and runs a command carried by `message`, returning the reply.
    ///
    /// Returns `None` when the message is ordinary chat.
    pub async fn run_command(&self, message: &ChatMessage) -> Option<OutboundMessage> {
        let command = Command::parse(&message.text, &self.prefix)?;

        let text = if self.access.permits(&command, message) {
            info!(
                "running {} for user {} (group {:?})",
                command.name(),
                message.user_id,
                message.group_id
            );
            self.service
                .execute(&command, message.group_id.as_deref())
                .await
        } else {
            warn!(
                "user {} denied {} in group {:?}",
                message.user_id,
                command.name(),
                message.group_id
            );
            PERMISSION_DENIED.to_string()
        };

        Some(OutboundMessage::new(reply_target(message), MessageChain::plain(text)))
    }

    async fn deliver(&self, message: OutboundMessage) {
        if let Err(e) = self.bus.send(message).await {
            error!("failed to deliver message: {e}");
        }
    }
}

fn reply_target(message: &ChatMessage) -> ReplyTarget {
    match &message.group_id {
        Some(group_id) => ReplyTarget::Group(group_id.clone()),
        None => ReplyTarget::Private(message.user_id.clone()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
