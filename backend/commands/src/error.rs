use thiserror::Error;

/// Failures of command registration, resolution, and handling.
///
/// `UnknownAlias`, `NotImplemented`, and `Rejected` are recovered by the
/// dispatcher and turned into a reply. Everything else propagates.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command alias: `{0}`")]
    UnknownAlias(String),

    #[error("alias `{alias}` of `{command}` is already registered by `{existing}`")]
    DuplicateAlias {
        alias: String,
        command: String,
        existing: String,
    },

    #[error("command `{0}` declares no aliases")]
    EmptyAliases(String),

    #[error("alias `{alias}` is not accepted by `{command}`")]
    InvalidAlias { alias: String, command: String },

    #[error("`{0}` is not implemented yet")]
    NotImplemented(String),

    /// The handler declined the request; the message is shown to the user.
    #[error("{0}")]
    Rejected(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    /// Whether the dispatcher answers this error with a reply instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownAlias(_) | Self::NotImplemented(_) | Self::Rejected(_)
        )
    }
}
