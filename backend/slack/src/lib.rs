//! Slack side of Kippo: the Web API notifier, request signing, and the
//! slash command endpoint.
pub mod notifier;
pub mod server;
pub mod signature;

pub use notifier::{SlackNotifier, SLACK_API_BASE};
pub use server::{SlashCommandEndpoint, DEFAULT_SLASH_COMMAND_PATH};
pub use signature::{verify_slack_signature, verify_slack_signature_at};
