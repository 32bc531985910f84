//! Typed runtime values derived from a prepared [`KippoConfig`].

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use kippo_commands::AttendanceSettings;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::*;
use crate::io::resolve_path;
use crate::schema::KippoConfig;

static OFFSET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").unwrap());

/// Parse `+09:00`, `-0530`, `Z` or `UTC`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("invalid offset"));
    }
    let caps = OFFSET_PATTERN
        .captures(value)
        .ok_or_else(|| anyhow!("invalid UTC offset `{value}`, expected e.g. +09:00"))?;
    let hours: i32 = caps[2].parse()?;
    let minutes: i32 = caps[3].parse()?;
    if minutes >= 60 {
        return Err(anyhow!("invalid UTC offset `{value}`: minutes out of range"));
    }
    let seconds = (hours * 3600 + minutes * 60) * if &caps[1] == "-" { -1 } else { 1 };
    FixedOffset::east_opt(seconds).ok_or_else(|| anyhow!("UTC offset `{value}` out of range"))
}

impl KippoConfig {
    pub fn attendance_settings(&self) -> Result<AttendanceSettings> {
        let attendance = self.attendance.clone().unwrap_or_default();
        let offset = attendance.utc_offset.as_deref().unwrap_or(DEFAULT_UTC_OFFSET);
        Ok(AttendanceSettings {
            utc_offset: parse_utc_offset(offset).context("attendance.utc_offset")?,
            cancel_window_minutes: attendance
                .cancel_window_minutes
                .unwrap_or(DEFAULT_CANCEL_WINDOW_MINUTES),
            image_refresh_days: attendance
                .image_refresh_days
                .unwrap_or(DEFAULT_IMAGE_REFRESH_DAYS),
        })
    }

    pub fn server_addr(&self) -> Result<SocketAddr> {
        let server = self.server.clone().unwrap_or_default();
        let bind = server.bind.as_deref().unwrap_or(DEFAULT_BIND);
        let port = server.port.unwrap_or(DEFAULT_PORT);
        format!("{bind}:{port}")
            .parse()
            .with_context(|| format!("invalid server address {bind}:{port}"))
    }

    pub fn slash_command_path(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.slash_command_path.clone())
            .unwrap_or_else(|| DEFAULT_SLASH_COMMAND_PATH.to_string())
    }

    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        let configured = self
            .database
            .as_ref()
            .and_then(|d| d.path.as_deref())
            .unwrap_or(DEFAULT_DATABASE_PATH);
        resolve_path(config_dir, configured)
    }

    pub fn storage_root(&self, config_dir: &Path) -> PathBuf {
        let configured = self
            .storage
            .as_ref()
            .and_then(|s| s.root.as_deref())
            .unwrap_or(DEFAULT_STORAGE_ROOT);
        resolve_path(config_dir, configured)
    }

    pub fn dump_bucket(&self) -> String {
        self.storage
            .as_ref()
            .and_then(|s| s.dump_bucket.clone())
            .unwrap_or_else(|| DEFAULT_DUMP_BUCKET.to_string())
    }

    pub fn dump_key_prefix(&self) -> String {
        self.storage
            .as_ref()
            .and_then(|s| s.dump_key_prefix.clone())
            .unwrap_or_else(|| DEFAULT_DUMP_KEY_PREFIX.to_string())
    }

    pub fn log_level(&self) -> String {
        self.logging
            .as_ref()
            .and_then(|l| l.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn log_dir(&self, config_dir: &Path) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .map(|dir| resolve_path(config_dir, dir))
    }
}
