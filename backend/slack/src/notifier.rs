/// Slack Web API notifier.
///
/// Channel posts go through `chat.postMessage` with the organization's bot
/// token, slash-command replies are POSTed to the command's `response_url`,
/// and profile images come from `users.info`.
use anyhow::{Context, Result};
use async_trait::async_trait;
use kippo_core::{Ack, Block, ChannelPost, Notifier, WebhookReply};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    blocks: &'a [Block],
}

/// Common envelope of Web API responses: HTTP 200 with `ok: false` on failure.
#[derive(Deserialize, Debug)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct UsersInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<UserInfo>,
}

#[derive(Deserialize, Debug)]
struct UserInfo {
    #[serde(default)]
    profile: Option<UserProfile>,
}

#[derive(Deserialize, Debug)]
struct UserProfile {
    #[serde(default)]
    image_192: Option<String>,
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SlackNotifier {
    http_client: Client,
    api_base: String,
}

impl Default for SlackNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackNotifier {
    pub fn new() -> Self {
        Self::with_api_base(SLACK_API_BASE)
    }

    /// Point the Web API calls somewhere else (a proxy or a local fake).
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send_immediate(&self, post: &ChannelPost) -> Result<Ack> {
        let res = self
            .http_client
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(&post.token)
            .json(&PostMessage {
                channel: &post.channel,
                blocks: &post.blocks,
            })
            .send()
            .await
            .context("chat.postMessage request failed")?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            error!("[Slack] chat.postMessage failed ({}): {}", status, body);
            anyhow::bail!("Slack send failed: {}", body);
        }
        let parsed: ApiResponse =
            serde_json::from_str(&body).context("unexpected chat.postMessage response")?;
        if !parsed.ok {
            let reason = parsed.error.unwrap_or_else(|| "unknown_error".into());
            error!("[Slack] chat.postMessage to {} rejected: {}", post.channel, reason);
            anyhow::bail!("Slack send failed: {}", reason);
        }

        info!("[Slack] Sent message to channel {}", post.channel);
        Ok(Ack {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_deferred(&self, response_url: &str, reply: &WebhookReply) -> Result<Ack> {
        let res = self
            .http_client
            .post(response_url)
            .json(reply)
            .send()
            .await
            .context("response_url request failed")?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            error!("[Slack] response_url reply failed ({}): {}", status, body);
            anyhow::bail!("Slack reply failed: {}", body);
        }
        debug!(status = status.as_u16(), "Posted slash command reply");
        Ok(Ack {
            status: status.as_u16(),
            body,
        })
    }

    async fn user_image_url(&self, token: &str, slack_user_id: &str) -> Result<Option<String>> {
        let res = self
            .http_client
            .get(self.method_url("users.info"))
            .bearer_auth(token)
            .query(&[("user", slack_user_id)])
            .send()
            .await
            .context("users.info request failed")?;

        if !res.status().is_success() {
            let err = res.text().await.unwrap_or_default();
            anyhow::bail!("users.info failed: {}", err);
        }
        let parsed: UsersInfoResponse = res.json().await.context("unexpected users.info response")?;
        if !parsed.ok {
            anyhow::bail!(
                "users.info failed for {}: {}",
                slack_user_id,
                parsed.error.unwrap_or_default()
            );
        }
        Ok(parsed
            .user
            .and_then(|u| u.profile)
            .and_then(|p| p.image_192)
            .filter(|url| !url.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    /// Serve a fake Web API on an ephemeral port and return its base URL.
    async fn fake_slack(seen: Seen) -> String {
        async fn post_message(
            State(seen): State<Seen>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let ok = body["channel"] != "#missing";
            seen.lock().unwrap().push((auth, body));
            if ok {
                Json(json!({"ok": true, "ts": "1.0"}))
            } else {
                Json(json!({"ok": false, "error": "channel_not_found"}))
            }
        }

        async fn users_info(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
            match query.get("user").map(String::as_str) {
                Some("U1") => Json(json!({
                    "ok": true,
                    "user": {"profile": {"image_192": "https://img/U1_192.png"}}
                })),
                _ => Json(json!({"ok": false, "error": "user_not_found"})),
            }
        }

        async fn hook(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
            seen.lock().unwrap().push(("hook".into(), body));
            StatusCode::OK
        }

        let app = Router::new()
            .route("/api/chat.postMessage", post(post_message))
            .route("/api/users.info", get(users_info))
            .route("/hook", post(hook))
            .route("/broken", post(|| async { StatusCode::NOT_FOUND }))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_send_immediate_posts_blocks_with_token() {
        let seen = Seen::default();
        let base = fake_slack(seen.clone()).await;
        let notifier = SlackNotifier::with_api_base(format!("{base}/api/"));

        let post = ChannelPost {
            token: "xoxb-1".into(),
            channel: "#attendance".into(),
            blocks: vec![Block::section("Alice clocked in")],
        };
        let ack = notifier.send_immediate(&post).await.unwrap();
        assert!(ack.is_ok());
        assert!(ack.body.contains("\"ok\":true"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "Bearer xoxb-1");
        assert_eq!(seen[0].1["channel"], "#attendance");
        assert_eq!(seen[0].1["blocks"][0]["text"]["text"], "Alice clocked in");
    }

    #[tokio::test]
    async fn test_send_immediate_api_error() {
        let base = fake_slack(Seen::default()).await;
        let notifier = SlackNotifier::with_api_base(format!("{base}/api"));
        let post = ChannelPost {
            token: "xoxb-1".into(),
            channel: "#missing".into(),
            blocks: Vec::new(),
        };
        let err = notifier.send_immediate(&post).await.unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }

    #[tokio::test]
    async fn test_send_deferred() {
        let seen = Seen::default();
        let base = fake_slack(seen.clone()).await;
        let notifier = SlackNotifier::new();

        let reply = WebhookReply::ephemeral(vec![Block::section("done")]);
        let ack = notifier
            .send_deferred(&format!("{base}/hook"), &reply)
            .await
            .unwrap();
        assert_eq!(ack.status, 200);
        assert_eq!(seen.lock().unwrap()[0].1["response_type"], "ephemeral");

        assert!(notifier
            .send_deferred(&format!("{base}/broken"), &reply)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_user_image_url() {
        let base = fake_slack(Seen::default()).await;
        let notifier = SlackNotifier::with_api_base(format!("{base}/api"));
        assert_eq!(
            notifier.user_image_url("xoxb-1", "U1").await.unwrap().as_deref(),
            Some("https://img/U1_192.png")
        );
        assert!(notifier.user_image_url("xoxb-1", "U404").await.is_err());
    }
}
