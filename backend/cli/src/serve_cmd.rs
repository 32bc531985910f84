//! `kippo serve`: accept Slack slash commands over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use kippo_core::Notifier;
use kippo_slack::{SlackNotifier, SlashCommandEndpoint};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::runtime::{build_dispatchers, Runtime};

pub async fn run(runtime: Runtime, port: Option<u16>) -> Result<()> {
    runtime.ensure_valid()?;
    let mut addr = runtime.config.server_addr()?;
    if let Some(port) = port {
        addr.set_port(port);
    }

    let store = runtime.open_store()?;
    let notifier: Arc<dyn Notifier> = Arc::new(SlackNotifier::new());
    let mut endpoint = SlashCommandEndpoint::new(runtime.config.slash_command_path());
    for dispatcher in build_dispatchers(&runtime.config, store, notifier)? {
        info!(
            organization = %dispatcher.organization().name,
            path = %endpoint.command_path(dispatcher.organization().id),
            "Accepting slash commands"
        );
        endpoint.add_dispatcher(dispatcher);
    }
    if endpoint.is_empty() {
        crate::terminal_output::note_warn("No organizations configured; every command will get 404");
    }

    let app = endpoint.build_router().layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, organizations = endpoint.len(), "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl-C, shutting down");
    }
}
