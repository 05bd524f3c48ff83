//! Conversation types and state management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conversational tag attached to every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    User,
    Bot,
    Insight,
    Tip,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::User => "user",
            Category::Bot => "bot",
            Category::Insight => "insight",
            Category::Tip => "tip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Document,
    Video,
}

impl MediaKind {
    /// Classify by the top-level MIME type. Anything that is not an image or
    /// a video is treated as a document.
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            _ => MediaKind::Document,
        }
    }
}

/// A file attached to a user message.
///
/// The locator only stays meaningful for the lifetime of the session that
/// received it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub locator: String,
    pub name: String,
}

impl MediaAttachment {
    pub fn new(mime: &str, locator: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::from_mime(mime),
            locator: locator.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,
}

impl Message {
    pub fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            category,
            timestamp: Utc::now(),
            media: None,
        }
    }

    pub fn with_media(mut self, media: Option<MediaAttachment>) -> Self {
        self.media = media;
        self
    }
}

/// Ordered, session-scoped message log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn add_user(&mut self, text: &str, media: Option<MediaAttachment>) -> &Message {
        self.push(Message::new(text, Category::User).with_media(media))
    }

    pub fn add_reply(&mut self, text: &str, category: Category) -> &Message {
        self.push(Message::new(text, category))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        // Just pushed, so the log is non-empty.
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Document);
    }

    #[test]
    fn test_conversation_keeps_order() {
        let mut conversation = Conversation::new();
        conversation.add_user("Oi", None);
        conversation.add_reply("Olá!", Category::Bot);
        conversation.add_reply("Use VPN.", Category::Tip);

        let categories: Vec<_> = conversation.messages.iter().map(|m| m.category).collect();
        assert_eq!(categories, vec![Category::User, Category::Bot, Category::Tip]);
        assert_ne!(conversation.messages[0].id, conversation.messages[1].id);

        conversation.clear();
        assert!(conversation.messages.is_empty());
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Insight).unwrap();
        assert_eq!(json, "\"insight\"");
        assert_eq!(Category::Tip.as_str(), "tip");
    }
}
