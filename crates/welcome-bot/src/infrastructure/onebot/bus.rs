//! [`EventBus`] backed by the WebSocket writer queue.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use welcome_core::OutboundMessage;

use crate::application::{BusError, EventBus};

/// Queues rendered action frames for the connection loop.
///
/// Frames queued while disconnected are written after the next successful
/// connect.
#[derive(Debug, Clone)]
pub struct WsEventBus {
    tx: mpsc::Sender<String>,
}

impl WsEventBus {
    /// Creates the bus and the receiving end the connection loop drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventBus for WsEventBus {
    async fn send(&self, message: OutboundMessage) -> Result<(), BusError> {
        let echo = Uuid::new_v4().to_string();
        let frame = serde_json::to_string(&message.to_action(&echo))
            .map_err(|e| BusError::Encode(e.to_string()))?;
        debug!("queueing action {echo} for {:?}", message.target);
        self.tx.send(frame).await.map_err(|_| BusError::Closed)
    }
}
