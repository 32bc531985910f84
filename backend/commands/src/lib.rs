//! Slash sub-command handling: alias registry, text/date extraction, the
//! built-in handlers and the per-organization dispatcher.
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{
    AttendanceSettings, CommandContext, CommandHandler, DispatchOutcome, DispatchStatus,
    Dispatcher, HandlerOutput, SlashCommandRequest,
};
pub use error::CommandError;
pub use extract::{datetime_from_text, extract_leading_datetime, leading_alias, split_alias, strip_alias};
pub use handlers::builtin_handlers;
pub use registry::{default_registry, CommandRegistry};
pub use types::CommandDescriptor;
