//! Platform protocol: inbound event extraction and outbound message shapes.
//!
//! The bot speaks OneBot v11.  Inbound events are kept as raw
//! `serde_json::Value`s until [`event::InboundEvent::classify`] pulls out the
//! handful of fields the bot cares about; everything else is ignored.
//! Outbound messages are built from [`segment::Segment`]s and rendered to the
//! OneBot JSON wire form only at the edge.

pub mod action;
pub mod event;
pub mod segment;

pub use action::{OutboundMessage, ReplyTarget};
pub use event::{ChatMessage, InboundEvent, MemberJoined, SenderRole};
pub use segment::{MessageChain, Segment};
