//! Built-in sub-command handlers.
//!
//! Each handler is a unit struct implementing `CommandHandler`. Declined
//! requests (wrong attendance state, unknown channel, ...) are reported with
//! `CommandError::Rejected` carrying the text shown to the user.
use std::sync::Arc;

use kippo_core::Block;

use crate::dispatch::CommandHandler;

mod attendance;
mod holiday;
mod listing;
mod projects;

pub use attendance::{
    AttendanceCancelHandler, BreakEndHandler, BreakStartHandler, ClockInHandler, ClockOutHandler,
    ListUsersHandler,
};
pub use holiday::{SetHolidayHandler, HALF_DAY_ALIASES};
pub use listing::ListCommandsHandler;
pub use projects::{ListProjectStatusHandler, ProjectStatusHandler};

/// Every built-in handler, in registration order.
pub fn builtin_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(ClockInHandler),
        Arc::new(ClockOutHandler),
        Arc::new(SetHolidayHandler),
        Arc::new(BreakStartHandler),
        Arc::new(BreakEndHandler),
        Arc::new(AttendanceCancelHandler),
        Arc::new(ListUsersHandler),
        Arc::new(ProjectStatusHandler),
        Arc::new(ListProjectStatusHandler),
        Arc::new(ListCommandsHandler),
    ]
}

/// A member notice: avatar context block when an image is known, plain
/// section otherwise.
pub(crate) fn member_notice(image_url: Option<&str>, display_name: &str, headline: &str, detail: &str) -> Block {
    match image_url {
        Some(url) => Block::image_context(
            url,
            display_name,
            format!("*{display_name}* {headline} {detail}").trim_end().to_string(),
        ),
        None => Block::section(
            format!("*{display_name}* {headline}\n{detail}").trim_end().to_string(),
        ),
    }
}
