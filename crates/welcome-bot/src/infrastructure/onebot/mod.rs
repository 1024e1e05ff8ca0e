//! OneBot v11 forward WebSocket adapter.
//!
//! - **`bus`**       – [`WsEventBus`]: the [`EventBus`](crate::application::EventBus)
//!   implementation.  Renders each outbound message as an action frame and
//!   queues it for the connection.
//! - **`ws_client`** – [`run_client`]: connects, feeds inbound events to the
//!   dispatcher, writes queued actions and reconnects on failure.

pub mod bus;
pub mod ws_client;

pub use bus::WsEventBus;
pub use ws_client::{run_client, OneBotSettings};
