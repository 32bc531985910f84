use async_trait::async_trait;
use chrono::Duration;
use kippo_core::{Block, PersonalHoliday};
use tracing::{debug, error, info};

use crate::dispatch::{CommandContext, CommandHandler, HandlerOutput};
use crate::error::CommandError;
use crate::extract::datetime_from_text;
use crate::types::CommandDescriptor;

/// Aliases that register a half day instead of a full day.
pub const HALF_DAY_ALIASES: &[&str] = &["AM半休", "午前休", "PM半休", "午後休", "半休"];

/// How far back existing holidays are checked for overlap.
const OVERLAP_LOOKBACK_DAYS: i64 = 30;

static SET_HOLIDAY: CommandDescriptor = CommandDescriptor {
    name: "set-holiday",
    description: "Register a day off. e.g. `COMMAND set-holiday YYYY/MM/DD`",
    aliases: &[
        "AM半休",
        "午前休",
        "PM半休",
        "午後休",
        "半休",
        "休日",
        "set-holiday",
        "setholiday",
    ],
};

pub struct SetHolidayHandler;

#[async_trait]
impl CommandHandler for SetHolidayHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &SET_HOLIDAY
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&SET_HOLIDAY)?;

        let (text, comment) = split_holiday_text(&ctx.text_without_alias());
        let Some(entry) = datetime_from_text(&text, ctx.now) else {
            error!(%text, "Holiday date not parsed");
            return Err(CommandError::Rejected(format!(
                "Unable to register the holiday.\nUse the `{} setholiday YY/MM/DD` format.",
                ctx.slash_command()
            )));
        };

        let day = entry.date_naive();
        let existing = ctx.store.holidays_between(
            ctx.user.id,
            day - Duration::days(OVERLAP_LOOKBACK_DAYS),
            day,
        )?;
        if existing.iter().any(|holiday| holiday.covers(day)) {
            error!(user = %ctx.user.username, %day, "Holiday already registered");
            return Err(CommandError::Rejected(format!(
                "A holiday is already registered on {day}."
            )));
        }

        let is_half = HALF_DAY_ALIASES.contains(&ctx.alias());
        let holiday = PersonalHoliday::new(ctx.user.id, day, is_half);
        ctx.store.insert_holiday(&holiday)?;
        info!(user = %ctx.user.username, %day, is_half, "Registered personal holiday");
        ctx.mark_valid()?;

        let kind = if is_half { "a half day" } else { "a full day" };
        let name = &ctx.user.display_name;
        let mut message = format!("*{name}* is taking {kind} off on `{day}`");
        if !comment.is_empty() {
            message.push_str(&format!("\n> {comment}"));
        }
        let notice = match ctx.profile_image_url(ctx.membership).await {
            Some(url) => Block::image_context(url, name.as_str(), message),
            None => Block::section(message),
        };
        let channel = &ctx.organization.slack_attendance_report_channel;
        Ok(
            HandlerOutput::reply(vec![Block::section(format!("Notified the `{channel}` channel."))])
                .with_channel_post(ctx.attendance_post(vec![notice])),
        )
    }
}

/// Split `DATE [HH:MM] [comment...]` into the date-time text to parse and
/// the comment. A missing time becomes `00:00`.
fn split_holiday_text(text: &str) -> (String, String) {
    let mut tokens = text.split_whitespace();
    let date = tokens.next().unwrap_or_default();
    let rest: Vec<&str> = tokens.collect();
    let (time, comment) = match rest.split_first() {
        Some((time, comment)) if time.contains(':') => (*time, comment),
        _ => {
            debug!(date, "Using 00:00 for date-only holiday text");
            ("00:00", rest.as_slice())
        }
    };
    (format!("{date} {time}"), comment.join(" "))
}
