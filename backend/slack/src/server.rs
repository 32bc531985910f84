//! Slash command HTTP endpoint.
//!
//! Slack posts each command form-encoded to
//! `{slash_command_path}/{organization_id}`. The request is matched to the
//! organization's dispatcher, its signature is checked with the
//! organization's signing secret, and the command is dispatched before Slack
//! gets its (empty) 200.
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use kippo_commands::{Dispatcher, SlashCommandRequest};
use kippo_logging::{CommandEvent, CommandLogger};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::signature::verify_slack_signature;

pub const DEFAULT_SLASH_COMMAND_PATH: &str = "/slack/commands";

/// Slash command payloads are a few hundred bytes.
const MAX_BODY_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Axum state
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct EndpointState {
    dispatchers: Arc<HashMap<Uuid, Arc<Dispatcher>>>,
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

pub struct SlashCommandEndpoint {
    path: String,
    dispatchers: HashMap<Uuid, Arc<Dispatcher>>,
}

impl SlashCommandEndpoint {
    pub fn new(path: impl Into<String>) -> Self {
        let path: String = path.into();
        let path = path.trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            dispatchers: HashMap::new(),
        }
    }

    /// Serve commands for the dispatcher's organization.
    pub fn add_dispatcher(&mut self, dispatcher: Dispatcher) {
        let id = dispatcher.organization().id;
        info!(
            organization = %dispatcher.organization().name,
            command = %dispatcher.organization().slash_command(),
            "[Slack] Registered slash command endpoint"
        );
        self.dispatchers.insert(id, Arc::new(dispatcher));
    }

    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }

    /// The route template commands are posted to.
    pub fn route(&self) -> String {
        format!("{}/:organization_id", self.path)
    }

    /// Where Slack should post commands for `organization_id`.
    pub fn command_path(&self, organization_id: Uuid) -> String {
        format!("{}/{organization_id}", self.path)
    }

    pub fn build_router(&self) -> Router {
        let state = EndpointState {
            dispatchers: Arc::new(self.dispatchers.clone()),
        };
        Router::new()
            .route(&self.route(), post(handle_slash_command))
            .route_layer(middleware::from_fn_with_state(state.clone(), verify_request))
            .route("/health", get(|| async { "OK" }))
            .with_state(state)
    }
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

/// Resolve the organization and check the request signature. The verified
/// dispatcher is handed to the handler as a request extension.
async fn verify_request(
    State(state): State<EndpointState>,
    Path(organization_id): Path<String>,
    request: Request,
    next: Next,
) -> Response {
    let dispatcher = Uuid::parse_str(&organization_id)
        .ok()
        .and_then(|id| state.dispatchers.get(&id).cloned());
    let Some(dispatcher) = dispatcher else {
        warn!(organization_id = %organization_id, "[Slack] Command for unknown organization");
        return (StatusCode::NOT_FOUND, "unknown_organization").into_response();
    };

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("[Slack] Unreadable command body: {}", err);
            return (StatusCode::PAYLOAD_TOO_LARGE, "body_too_large").into_response();
        }
    };

    let secret = &dispatcher.organization().slack_signing_secret;
    if !verify_slack_signature(&parts.headers, &bytes, secret) {
        warn!(
            organization = %dispatcher.organization().name,
            "[Slack] Invalid signature, rejecting command"
        );
        CommandLogger::log(
            &dispatcher.organization().name,
            None,
            CommandEvent::SignatureRejected,
        );
        return (StatusCode::UNAUTHORIZED, "invalid_signature").into_response();
    }

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(dispatcher);
    next.run(request).await
}

async fn handle_slash_command(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Form(request): Form<SlashCommandRequest>,
) -> Response {
    let organization = &dispatcher.organization().name;
    match dispatcher.dispatch(&request).await {
        Ok(outcome) => {
            info!(status = ?outcome.status, blocks = outcome.blocks.len(), "[Slack] Command dispatched");
            CommandLogger::log(
                organization,
                Some(&request.user_name),
                CommandEvent::Dispatched {
                    command: request.command.clone(),
                    text: request.text.clone(),
                    status: outcome.status.as_str().to_string(),
                },
            );
            StatusCode::OK.into_response()
        }
        Err(err) => {
            error!(organization = %organization, "[Slack] Command dispatch failed: {:#}", err);
            CommandLogger::log(
                organization,
                Some(&request.user_name),
                CommandEvent::Failed {
                    command: request.command.clone(),
                    text: request.text.clone(),
                    error_msg: format!("{err:#}"),
                },
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "dispatch_failed").into_response()
        }
    }
}
