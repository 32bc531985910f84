//! Clock-in/out, breaks, cancellation and the daily attendance listing.
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use kippo_core::{AttendanceCategory, AttendanceRecord, Block};
use tracing::{info, warn};

use super::member_notice;
use crate::dispatch::{CommandContext, CommandHandler, HandlerOutput};
use crate::error::CommandError;
use crate::extract::datetime_from_text;
use crate::types::CommandDescriptor;

static CLOCK_IN: CommandDescriptor = CommandDescriptor {
    name: "clock-in",
    description: "Record the start of work. e.g. `COMMAND clock-in`",
    aliases: &["出勤", "開始", "clockin", "clock-in"],
};

static CLOCK_OUT: CommandDescriptor = CommandDescriptor {
    name: "clock-out",
    description: "Record the end of work. e.g. `COMMAND clock-out`",
    aliases: &["退勤", "終了", "終わります", "clockout", "clock-out"],
};

static BREAK_START: CommandDescriptor = CommandDescriptor {
    name: "break-start",
    description: "Record the start of a break. e.g. `COMMAND break-start`",
    aliases: &["休憩開始", "休憩", "breakstart", "break-start"],
};

static BREAK_END: CommandDescriptor = CommandDescriptor {
    name: "break-end",
    description: "Record the end of a break. e.g. `COMMAND break-end`",
    aliases: &["休憩終了", "再開", "breakend", "break-end"],
};

static ATTENDANCE_CANCEL: CommandDescriptor = CommandDescriptor {
    name: "attendance-cancel",
    description: "Delete your attendance record of the last few minutes. e.g. `COMMAND attendance-cancel`",
    aliases: &["attendancecancel", "attendance-cancel"],
};

static LIST_USERS: CommandDescriptor = CommandDescriptor {
    name: "list-users",
    description: "Show today's attendance status of every member. e.g. `COMMAND list-users`",
    aliases: &["list-users", "listusers", "users"],
};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn insert_record(
    ctx: &CommandContext<'_>,
    category: AttendanceCategory,
    entry: DateTime<FixedOffset>,
) -> Result<AttendanceRecord, CommandError> {
    let record = AttendanceRecord::new(ctx.organization.id, ctx.user.id, category, entry);
    ctx.store.insert_attendance(&record)?;
    info!(
        organization = %ctx.organization.name,
        user = %ctx.user.username,
        category = %category,
        entry = %entry,
        "Created attendance record"
    );
    Ok(record)
}

fn not_clocked_in(ctx: &CommandContext<'_>, latest: Option<&AttendanceRecord>, then: &str) -> CommandError {
    let history = match latest {
        Some(record) => format!(
            "Latest record > {} {}",
            record.category,
            ctx.local_display(&record.entry_datetime)
        ),
        None => "No attendance record found.".to_string(),
    };
    CommandError::Rejected(format!(
        ":warning: You are not clocked in.\n{history}\nClock in with `{} clock-in MM/DD HH:MM` first, then {then}.",
        ctx.slash_command()
    ))
}

/// Record a clock-in or clock-out.
///
/// Without an explicit time the entry is "now" and the attendance channel is
/// notified. Entries with an explicit time are recorded silently.
async fn record_shift_change(
    ctx: &CommandContext<'_>,
    category: AttendanceCategory,
    headline: &str,
) -> Result<HandlerOutput, CommandError> {
    let text = ctx.text_without_alias();
    let explicit = datetime_from_text(&text, ctx.now);
    let entry = explicit.unwrap_or(ctx.now);
    insert_record(ctx, category, entry)?;
    ctx.mark_valid()?;

    let channel = &ctx.organization.slack_attendance_report_channel;
    if explicit.is_some() {
        return Ok(HandlerOutput::reply(vec![Block::section(format!(
            "Recorded `{category}` at `{}`.\n(Entries with an explicit time are not announced in {channel})",
            entry.format("%Y-%m-%d %H:%M")
        ))]));
    }

    let image_url = ctx.profile_image_url(ctx.membership).await;
    if image_url.is_none() {
        warn!(user = %ctx.user.username, "No Slack image for member, posting plain notice");
    }
    let notice = member_notice(image_url.as_deref(), &ctx.user.display_name, headline, &text);
    Ok(
        HandlerOutput::reply(vec![Block::section(format!("Notified the `{channel}` channel."))])
            .with_channel_post(ctx.attendance_post(vec![notice])),
    )
}

struct BreakLabels {
    recorded: &'static str,
    now: &'static str,
    planned: &'static str,
}

const BREAK_START_LABELS: BreakLabels = BreakLabels {
    recorded: "Break start recorded.",
    now: "is taking a break!",
    planned: "plans to take a break at",
};

const BREAK_END_LABELS: BreakLabels = BreakLabels {
    recorded: "Break end recorded.",
    now: "is back from break!",
    planned: "plans to be back at",
};

/// Entry time of a break record and the channel headline, if it is announced.
///
/// "Now" and later today are announced; any other explicit time is not.
fn break_entry(
    ctx: &CommandContext<'_>,
    text: &str,
    labels: &BreakLabels,
) -> (DateTime<FixedOffset>, Option<String>) {
    match datetime_from_text(text, ctx.now) {
        None => (ctx.now, Some(labels.now.to_string())),
        Some(at) if at > ctx.now && at.date_naive() == ctx.today() => {
            (at, Some(format!("{} {}!", labels.planned, at.format("%H:%M"))))
        }
        Some(at) => {
            if at > ctx.now {
                warn!(entry = %at, now = %ctx.now, "Break entry is not today, no channel notice");
            }
            (at, None)
        }
    }
}

fn break_output(
    ctx: &CommandContext<'_>,
    labels: &BreakLabels,
    entry: DateTime<FixedOffset>,
    headline: Option<String>,
    text: &str,
    detail: Option<String>,
    image_url: Option<String>,
) -> HandlerOutput {
    let channel = &ctx.organization.slack_attendance_report_channel;
    let mut message = labels.recorded.to_string();
    if let Some(detail) = detail {
        message.push(' ');
        message.push_str(&detail);
    }
    match headline {
        Some(headline) => {
            message.push_str(&format!("\nNotified the `{channel}` channel."));
            let notice = member_notice(image_url.as_deref(), &ctx.user.display_name, &headline, text);
            HandlerOutput::reply(vec![Block::section(message)])
                .with_channel_post(ctx.attendance_post(vec![notice]))
        }
        None => {
            message.push_str(&format!(
                "\nNot announced in `{channel}` because the entry ({}) is not for today.",
                entry.format("%Y-%m-%d %H:%M")
            ));
            HandlerOutput::reply(vec![Block::section(message)])
        }
    }
}

// ---------------------------------------------------------------------------
// clock-in
// ---------------------------------------------------------------------------

pub struct ClockInHandler;

#[async_trait]
impl CommandHandler for ClockInHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &CLOCK_IN
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&CLOCK_IN)?;
        if let Some(latest) = ctx.latest_attendance()? {
            if latest.category != AttendanceCategory::End {
                warn!(user = %ctx.user.username, category = %latest.category, "clock-in while already working");
                return Err(CommandError::Rejected(format!(
                    ":warning: Already clocked in. {}\nClock out with `{} clockout MM/DD HH:MM` first, then clock in.",
                    ctx.local_display(&latest.entry_datetime),
                    ctx.slash_command()
                )));
            }
        }
        record_shift_change(ctx, AttendanceCategory::Start, "clocked in!").await
    }
}

// ---------------------------------------------------------------------------
// clock-out
// ---------------------------------------------------------------------------

pub struct ClockOutHandler;

#[async_trait]
impl CommandHandler for ClockOutHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &CLOCK_OUT
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&CLOCK_OUT)?;
        match ctx.latest_attendance()? {
            Some(latest)
                if matches!(latest.category, AttendanceCategory::Start | AttendanceCategory::BreakEnd) =>
            {
                record_shift_change(ctx, AttendanceCategory::End, "clocked out!").await
            }
            Some(latest) if latest.category == AttendanceCategory::BreakStart => {
                warn!(user = %ctx.user.username, "clock-out while on a break");
                Err(CommandError::Rejected(format!(
                    ":warning: You are on a break since {}.\nEnd it with `{} break-end` first, then clock out.",
                    ctx.local_display(&latest.entry_datetime),
                    ctx.slash_command()
                )))
            }
            latest => {
                warn!(user = %ctx.user.username, "clock-out without clock-in");
                Err(not_clocked_in(ctx, latest.as_ref(), "clock out"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// break-start
// ---------------------------------------------------------------------------

pub struct BreakStartHandler;

#[async_trait]
impl CommandHandler for BreakStartHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &BREAK_START
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&BREAK_START)?;
        match ctx.latest_attendance()? {
            Some(latest)
                if matches!(latest.category, AttendanceCategory::Start | AttendanceCategory::BreakEnd) =>
            {
                let text = ctx.text_without_alias();
                let (entry, headline) = break_entry(ctx, &text, &BREAK_START_LABELS);
                insert_record(ctx, AttendanceCategory::BreakStart, entry)?;
                ctx.mark_valid()?;
                Ok(break_output(ctx, &BREAK_START_LABELS, entry, headline, &text, None, None))
            }
            Some(latest) if latest.category == AttendanceCategory::BreakStart => {
                Err(CommandError::Rejected(format!(
                    ":warning: Already on a break.\nLatest record > {} {}",
                    latest.category,
                    ctx.local_display(&latest.entry_datetime)
                )))
            }
            latest => {
                warn!(user = %ctx.user.username, "break-start without clock-in");
                Err(not_clocked_in(ctx, latest.as_ref(), "take a break"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// break-end
// ---------------------------------------------------------------------------

pub struct BreakEndHandler;

#[async_trait]
impl CommandHandler for BreakEndHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &BREAK_END
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&BREAK_END)?;
        let latest = ctx.latest_attendance()?;
        let Some(break_start) = latest.filter(|r| r.category == AttendanceCategory::BreakStart) else {
            warn!(user = %ctx.user.username, "break-end without break-start");
            return Err(CommandError::Rejected(format!(
                ":warning: You are not on a break.\nStart one with `{} break-start` first.",
                ctx.slash_command()
            )));
        };

        let text = ctx.text_without_alias();
        let (entry, headline) = break_entry(ctx, &text, &BREAK_END_LABELS);
        insert_record(ctx, AttendanceCategory::BreakEnd, entry)?;
        ctx.mark_valid()?;

        let minutes = (entry - break_start.entry_datetime).num_minutes().max(0);
        let detail = format!("({:.1}h break)", minutes as f64 / 60.0);
        let image_url = match headline {
            Some(_) => ctx.profile_image_url(ctx.membership).await,
            None => None,
        };
        Ok(break_output(ctx, &BREAK_END_LABELS, entry, headline, &text, Some(detail), image_url))
    }
}

// ---------------------------------------------------------------------------
// attendance-cancel
// ---------------------------------------------------------------------------

pub struct AttendanceCancelHandler;

#[async_trait]
impl CommandHandler for AttendanceCancelHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &ATTENDANCE_CANCEL
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&ATTENDANCE_CANCEL)?;
        let since = ctx.now - Duration::minutes(ctx.settings.cancel_window_minutes);
        let latest = ctx
            .store
            .latest_attendance_since(ctx.organization.id, ctx.user.id, since)?;
        let Some(record) = latest else {
            warn!(user = %ctx.user.username, since = %since, "No attendance record to cancel");
            return Err(CommandError::Rejected(format!(
                "No record found at or after {}.",
                ctx.local_display(&since)
            )));
        };

        ctx.store.delete_attendance(record.id)?;
        info!(user = %ctx.user.username, record = %record.id, category = %record.category, "Deleted attendance record");
        ctx.mark_valid()?;
        Ok(HandlerOutput::reply(vec![Block::section(format!(
            "({}) `{}` record deleted.",
            ctx.local_display(&record.entry_datetime),
            record.category
        ))]))
    }
}

// ---------------------------------------------------------------------------
// list-users
// ---------------------------------------------------------------------------

pub struct ListUsersHandler;

#[async_trait]
impl CommandHandler for ListUsersHandler {
    fn descriptor(&self) -> &CommandDescriptor {
        &LIST_USERS
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<HandlerOutput, CommandError> {
        ctx.ensure_alias(&LIST_USERS)?;
        let today = ctx.today();
        let records = ctx
            .store
            .latest_attendance_per_user_since(ctx.organization.id, ctx.start_of_today())?;
        if records.is_empty() {
            warn!(organization = %ctx.organization.name, %today, "No attendance records today");
            return Ok(HandlerOutput::reply(vec![Block::section(format!(
                "No attendance records found for today ({today})."
            ))]));
        }

        let mut blocks = vec![Block::section(format!("Attendance today ({today}):"))];
        for record in records {
            let Some(user) = ctx.store.get_user(record.created_by)? else {
                warn!(user_id = %record.created_by, "Attendance record of an unknown user");
                continue;
            };
            let membership = ctx.store.get_membership(ctx.organization.id, user.id)?;
            let image_url = match &membership {
                Some(membership) => ctx.profile_image_url(membership).await,
                None => None,
            };
            let status = format!(
                "{}: {}",
                ctx.local_display(&record.entry_datetime),
                record.category.status_label()
            );
            blocks.push(match image_url {
                Some(url) => Block::image_context(
                    url,
                    user.display_name.clone(),
                    format!("*{}* {status}", user.display_name),
                ),
                None => Block::section(format!(":white_square: *{}* {status}", user.display_name)),
            });
        }
        ctx.mark_valid()?;
        Ok(HandlerOutput::reply(blocks))
    }
}
