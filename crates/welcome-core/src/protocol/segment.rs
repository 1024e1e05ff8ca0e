//! Outbound message segments.
//!
//! A message is an ordered [`MessageChain`] of [`Segment`]s.  The welcome
//! message is always `[Mention, Text, Image?]`; command replies are a single
//! `Text`.
//!
//! # Wire form
//!
//! [`MessageChain::to_onebot`] renders the OneBot v11 array representation:
//!
//! ```json
//! [{"type":"at","data":{"qq":"555"}},
//!  {"type":"text","data":{"text":" Welcome!"}},
//!  {"type":"image","data":{"file":"file:///srv/bot/welcome_images/cat.png"}}]
//! ```

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// One component of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An at-reference to a user.
    Mention { user_id: String },
    /// Plain text.
    Text { text: String },
    /// A local image, by absolute path.
    Image { path: PathBuf },
}

impl Segment {
    pub fn mention(user_id: impl Into<String>) -> Self {
        Segment::Mention {
            user_id: user_id.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Segment::Image { path: path.into() }
    }

    /// Renders the OneBot v11 segment object.
    pub fn to_onebot(&self) -> Value {
        match self {
            Segment::Mention { user_id } => json!({"type": "at", "data": {"qq": user_id}}),
            Segment::Text { text } => json!({"type": "text", "data": {"text": text}}),
            Segment::Image { path } => json!({"type": "image", "data": {"file": file_uri(path)}}),
        }
    }
}

/// `file://` URI for a local path, as OneBot implementations expect.
fn file_uri(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{display}")
    } else {
        // Windows drive paths: C:/... → file:///C:/...
        format!("file:///{display}")
    }
}

/// An ordered sequence of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageChain {
    segments: Vec<Segment>,
}

impl MessageChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain holding a single text segment.
    pub fn plain(text: impl Into<String>) -> Self {
        let mut chain = Self::new();
        chain.push(Segment::text(text));
        chain
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Paths of all image segments, in order.
    pub fn images(&self) -> impl Iterator<Item = &Path> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Image { path } => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Renders the OneBot v11 message array.
    pub fn to_onebot(&self) -> Value {
        Value::Array(self.segments.iter().map(Segment::to_onebot).collect())
    }
}

impl From<Vec<Segment>> for MessageChain {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}
