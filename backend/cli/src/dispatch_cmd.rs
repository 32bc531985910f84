//! `kippo dispatch`: run one slash command locally, printing what would be
//! posted to Slack.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use kippo_commands::{DispatchOutcome, SlashCommandRequest};
use kippo_core::Notifier;

use crate::console::{ConsoleNotifier, CONSOLE_RESPONSE_URL};
use crate::runtime::{build_dispatchers, Runtime};
use crate::terminal_output::{note_info, note_success};

pub struct DispatchArgs {
    pub organization: Option<String>,
    pub slack_username: String,
    pub channel: String,
    pub text: Vec<String>,
}

pub async fn run(runtime: Runtime, args: DispatchArgs) -> Result<()> {
    let notifier = Arc::new(ConsoleNotifier::default());
    let outcome = dispatch(&runtime, notifier, args).await?;
    note_success(&format!("Dispatched: {}", outcome.status.as_str()));
    if outcome.channel_ack.is_none() {
        note_info("Nothing was posted to the attendance channel");
    }
    Ok(())
}

pub(crate) async fn dispatch(
    runtime: &Runtime,
    notifier: Arc<dyn Notifier>,
    args: DispatchArgs,
) -> Result<DispatchOutcome> {
    runtime.ensure_valid()?;
    let store = runtime.open_store()?;
    let dispatchers = build_dispatchers(&runtime.config, store, notifier)?;
    let dispatcher = match &args.organization {
        Some(name) => dispatchers
            .into_iter()
            .find(|d| &d.organization().name == name)
            .ok_or_else(|| anyhow!("organization '{name}' is not configured"))?,
        None => dispatchers
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no organizations configured"))?,
    };

    let request = SlashCommandRequest {
        command: dispatcher.organization().slash_command(),
        text: args.text.join(" "),
        response_url: CONSOLE_RESPONSE_URL.to_string(),
        user_name: args.slack_username,
        channel_name: args.channel,
        ..Default::default()
    };
    Ok(dispatcher.dispatch(&request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_runtime;
    use kippo_commands::DispatchStatus;
    use kippo_core::Store;

    fn args(user: &str, text: &str) -> DispatchArgs {
        DispatchArgs {
            organization: None,
            slack_username: user.to_string(),
            channel: "general".to_string(),
            text: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_clock_in_through_console() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = test_runtime(dir.path()).await;
        let notifier = Arc::new(ConsoleNotifier::default());

        let outcome = dispatch(&runtime, notifier.clone(), args("alice", "clock-in"))
            .await
            .unwrap();
        assert_eq!(outcome.status, DispatchStatus::Handled);

        let transcript = notifier.transcript();
        assert!(transcript.iter().any(|line| line.starts_with("[#attendance]")));
        assert!(transcript
            .iter()
            .any(|line| line.starts_with("[reply ephemeral -> console://reply]")));

        let store = runtime.open_store().unwrap();
        let org = store.find_organization_by_name("acme").unwrap().unwrap();
        let alice = store.find_user_by_username("alice").unwrap().unwrap();
        assert!(store.latest_attendance(org.id, alice.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_gets_reply() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = test_runtime(dir.path()).await;
        let notifier = Arc::new(ConsoleNotifier::default());

        let outcome = dispatch(&runtime, notifier.clone(), args("mallory", "clock-in"))
            .await
            .unwrap();
        assert_eq!(outcome.status, DispatchStatus::UnknownUser);
        assert_eq!(notifier.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_organization_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = test_runtime(dir.path()).await;
        let mut args = args("alice", "clock-in");
        args.organization = Some("globex".into());
        let err = dispatch(&runtime, Arc::new(ConsoleNotifier::default()), args)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("globex"));
    }
}
