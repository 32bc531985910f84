//! Notifier that prints to the terminal instead of calling Slack, used by
//! `kippo dispatch` to try commands locally.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use kippo_core::{Ack, Block, ChannelPost, Notifier, WebhookReply};

pub const CONSOLE_RESPONSE_URL: &str = "console://reply";

#[derive(Default)]
pub struct ConsoleNotifier {
    transcript: Mutex<Vec<String>>,
}

impl ConsoleNotifier {
    /// Every line printed so far.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn emit(&self, header: String, blocks: &[Block]) {
        let text = render_blocks(blocks);
        let line = format!("{header}\n{text}");
        println!("{line}");
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.push(line);
        }
    }
}

/// The text of each block on its own line, indented.
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(Block::text)
        .flat_map(str::lines)
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn console_ack() -> Ack {
    Ack {
        status: 200,
        body: "console".into(),
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_immediate(&self, post: &ChannelPost) -> Result<Ack> {
        self.emit(format!("[{}]", post.channel), &post.blocks);
        Ok(console_ack())
    }

    async fn send_deferred(&self, response_url: &str, reply: &WebhookReply) -> Result<Ack> {
        let visibility = serde_json::to_value(reply.response_type)?;
        let header = format!(
            "[reply {} -> {}]",
            visibility.as_str().unwrap_or("ephemeral"),
            response_url
        );
        self.emit(header, &reply.blocks);
        Ok(console_ack())
    }

    async fn user_image_url(&self, _token: &str, _slack_user_id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_blocks() {
        let blocks = vec![
            Block::section("line one\nline two"),
            Block::image_context("https://img/a.png", "alice", "Alice clocked in"),
        ];
        assert_eq!(
            render_blocks(&blocks),
            "    line one\n    line two\n    Alice clocked in"
        );
    }

    #[tokio::test]
    async fn test_transcript_records_posts_and_replies() {
        let notifier = ConsoleNotifier::default();
        notifier
            .send_immediate(&ChannelPost {
                token: "xoxb".into(),
                channel: "#attendance".into(),
                blocks: vec![Block::section("hello")],
            })
            .await
            .unwrap();
        notifier
            .send_deferred(CONSOLE_RESPONSE_URL, &WebhookReply::ephemeral(vec![Block::section("done")]))
            .await
            .unwrap();

        assert_eq!(
            notifier.transcript(),
            vec![
                "[#attendance]\n    hello".to_string(),
                "[reply ephemeral -> console://reply]\n    done".to_string(),
            ]
        );
    }
}
