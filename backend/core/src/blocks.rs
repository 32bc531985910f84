//! Slack Block Kit message model.
//!
//! Only the block types the command handlers emit are modelled. Serialising
//! with `serde_json` yields the exact JSON Slack expects.

use serde::{Deserialize, Serialize};

/// One structured fragment of a Slack message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
    Context { elements: Vec<ContextElement> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
    PlainText { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextElement {
    Image { image_url: String, alt_text: String },
    Mrkdwn { text: String },
}

impl Block {
    /// A `section` block with markdown text.
    pub fn section(text: impl Into<String>) -> Self {
        Self::Section {
            text: TextObject::Mrkdwn { text: text.into() },
        }
    }

    /// A `context` block showing a small avatar next to markdown text.
    pub fn image_context(
        image_url: impl Into<String>,
        alt_text: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::Context {
            elements: vec![
                ContextElement::Image {
                    image_url: image_url.into(),
                    alt_text: alt_text.into(),
                },
                ContextElement::Mrkdwn { text: text.into() },
            ],
        }
    }

    /// The first text carried by the block, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Section { text } => match text {
                TextObject::Mrkdwn { text } | TextObject::PlainText { text } => Some(text),
            },
            Self::Context { elements } => elements.iter().find_map(|e| match e {
                ContextElement::Mrkdwn { text } => Some(text.as_str()),
                ContextElement::Image { .. } => None,
            }),
        }
    }
}

/// Visibility of a slash-command reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    #[default]
    Ephemeral,
}

/// Immediate notification: a message posted to a channel with the
/// organization's bot token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPost {
    #[serde(skip)]
    pub token: String,
    pub channel: String,
    pub blocks: Vec<Block>,
}

/// Deferred notification: a reply posted to a slash command's `response_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookReply {
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl WebhookReply {
    pub fn ephemeral(blocks: Vec<Block>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            blocks,
            text: None,
        }
    }
}

/// Acknowledgement returned by a notification send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub status: u16,
    pub body: String,
}

impl Ack {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_wire_format() {
        let json = serde_json::to_value(Block::section("*hello*")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "section", "text": {"type": "mrkdwn", "text": "*hello*"}})
        );
    }

    #[test]
    fn test_image_context_wire_format() {
        let block = Block::image_context("https://img.test/a.png", "Alice", "*Alice* clocked in");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "context");
        assert_eq!(json["elements"][0]["type"], "image");
        assert_eq!(json["elements"][0]["alt_text"], "Alice");
        assert_eq!(json["elements"][1]["type"], "mrkdwn");
        assert_eq!(block.text(), Some("*Alice* clocked in"));
    }

    #[test]
    fn test_channel_post_omits_token() {
        let post = ChannelPost {
            token: "xoxb-secret".into(),
            channel: "#attendance".into(),
            blocks: vec![Block::section("hi")],
        };
        let json = serde_json::to_string(&post).unwrap();
        assert!(!json.contains("xoxb-secret"));
        assert!(json.contains("#attendance"));
    }

    #[test]
    fn test_webhook_reply_is_ephemeral() {
        let reply = WebhookReply::ephemeral(vec![Block::section("only you")]);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["response_type"], "ephemeral");
        assert!(json.get("text").is_none());
    }
}
