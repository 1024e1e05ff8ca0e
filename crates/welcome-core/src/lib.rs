//! # welcome-core
//!
//! Shared library for the group welcome bot containing the pure domain types:
//! welcome settings, the command grammar, inbound event extraction and the
//! outbound message representation.
//!
//! This crate has zero dependencies on async runtimes, sockets or the file
//! system.  Everything here can be exercised with plain `#[test]` functions.
//!
//! # Architecture overview
//!
//! The bot listens to a chat platform (a OneBot v11 implementation) and, when
//! somebody joins a group on the allow-list, greets them with a mention, a
//! configurable text and optionally a random picture.  Administrators manage
//! the allow-list and the text with `welcome_*` chat commands.
//!
//! - **`domain`** – What the bot knows: [`WelcomeConfig`] with its
//!   [`AllowList`], the [`Command`] grammar, image-file recognition and the
//!   process-level [`BotSettings`].
//!
//! - **`protocol`** – How the bot talks to the platform: tolerant extraction
//!   of [`InboundEvent`]s from raw JSON, the [`MessageChain`] of segments and
//!   the [`OutboundMessage`] envelope rendered as a OneBot action.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `welcome_core::WelcomeConfig` instead of the full module path.
pub use domain::command::Command;
pub use domain::config::{AllowList, WelcomeConfig};
pub use domain::settings::BotSettings;
pub use protocol::action::{OutboundMessage, ReplyTarget};
pub use protocol::event::{ChatMessage, InboundEvent, MemberJoined, SenderRole};
pub use protocol::segment::{MessageChain, Segment};
