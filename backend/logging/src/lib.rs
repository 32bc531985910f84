//! Structured logging for Kippo.
//!
//! Console plus daily-rolling NDJSON output, Slack secret redaction, and the
//! per-command audit trail.

pub mod command_log;
pub mod logger;
pub mod redact;

pub use command_log::{CommandEvent, CommandLogEntry, CommandLogger};
pub use logger::{init_logger, LOG_FILE_NAME};
pub use redact::redact_sensitive_data;
