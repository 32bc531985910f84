//! Config defaults: applies default values to parsed config.

use crate::schema::{
    AttendanceConfig, DatabaseConfig, KippoConfig, LoggingConfig, ServerConfig, StorageConfig,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SLASH_COMMAND_PATH: &str = "/slack/commands";
pub const DEFAULT_DATABASE_PATH: &str = "kippo.db";
pub const DEFAULT_UTC_OFFSET: &str = "+09:00";
pub const DEFAULT_CANCEL_WINDOW_MINUTES: i64 = 5;
pub const DEFAULT_IMAGE_REFRESH_DAYS: i64 = 7;
pub const DEFAULT_STORAGE_ROOT: &str = "objects";
pub const DEFAULT_DUMP_BUCKET: &str = "kippo-dumps";
pub const DEFAULT_DUMP_KEY_PREFIX: &str = "dumpdata/";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: KippoConfig) -> KippoConfig {
    let config = apply_server_defaults(config);
    let config = apply_database_defaults(config);
    let config = apply_attendance_defaults(config);
    let config = apply_storage_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: KippoConfig) -> KippoConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server
        .slash_command_path
        .get_or_insert_with(|| DEFAULT_SLASH_COMMAND_PATH.to_string());
    config
}

fn apply_database_defaults(mut config: KippoConfig) -> KippoConfig {
    let database = config.database.get_or_insert_with(DatabaseConfig::default);
    database
        .path
        .get_or_insert_with(|| DEFAULT_DATABASE_PATH.to_string());
    config
}

fn apply_attendance_defaults(mut config: KippoConfig) -> KippoConfig {
    let attendance = config.attendance.get_or_insert_with(AttendanceConfig::default);
    attendance
        .utc_offset
        .get_or_insert_with(|| DEFAULT_UTC_OFFSET.to_string());
    attendance
        .cancel_window_minutes
        .get_or_insert(DEFAULT_CANCEL_WINDOW_MINUTES);
    attendance
        .image_refresh_days
        .get_or_insert(DEFAULT_IMAGE_REFRESH_DAYS);
    config
}

fn apply_storage_defaults(mut config: KippoConfig) -> KippoConfig {
    let storage = config.storage.get_or_insert_with(StorageConfig::default);
    storage.root.get_or_insert_with(|| DEFAULT_STORAGE_ROOT.to_string());
    storage
        .dump_bucket
        .get_or_insert_with(|| DEFAULT_DUMP_BUCKET.to_string());
    storage
        .dump_key_prefix
        .get_or_insert_with(|| DEFAULT_DUMP_KEY_PREFIX.to_string());
    config
}

fn apply_logging_defaults(mut config: KippoConfig) -> KippoConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(KippoConfig::default());
        let server = cfg.server.unwrap();
        assert_eq!(server.port, Some(DEFAULT_PORT));
        assert_eq!(server.slash_command_path.as_deref(), Some("/slack/commands"));
        let attendance = cfg.attendance.unwrap();
        assert_eq!(attendance.utc_offset.as_deref(), Some("+09:00"));
        assert_eq!(attendance.cancel_window_minutes, Some(5));
        assert_eq!(attendance.image_refresh_days, Some(7));
        assert_eq!(cfg.storage.unwrap().dump_bucket.as_deref(), Some("kippo-dumps"));
        assert_eq!(cfg.logging.unwrap().dir, None);
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = KippoConfig::default();
        cfg.attendance = Some(AttendanceConfig {
            cancel_window_minutes: Some(10),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        let attendance = cfg.attendance.unwrap();
        assert_eq!(attendance.cancel_window_minutes, Some(10));
        assert_eq!(attendance.image_refresh_days, Some(DEFAULT_IMAGE_REFRESH_DAYS));
    }
}
