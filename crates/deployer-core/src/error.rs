use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployerError {
    #[error("config error at '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("cannot read config {path}: {reason}")]
    ConfigSource { path: String, reason: String },

    #[error("invalid address '{0}': expected 0x followed by 40 hex digits")]
    InvalidAddress(String),

    #[error("invalid stage '{stage}': {reason}")]
    InvalidStage { stage: String, reason: String },

    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    #[error("cannot link '{library}' into '{dependent}': {reason}")]
    Link {
        library: String,
        dependent: String,
        reason: String,
    },

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("deploy of '{component}' failed: {reason}")]
    Deploy { component: String, reason: String },

    #[error("post-action '{action}' (#{position}) of step '{step}' failed: {reason}")]
    PostAction {
        step: String,
        action: String,
        position: usize,
        reason: String,
    },

    #[error("registry conflict for '{name}': already {existing}, refusing {attempted}")]
    RegistryConflict {
        name: String,
        existing: String,
        attempted: String,
    },

    #[error("'{name}' is not registered (needed by '{needed_by}')")]
    NotRegistered { name: String, needed_by: String },

    #[error("invalid step transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeployerError {
    pub(crate) fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Coarse classification so callers can tell a bad config from a remote
    /// failure without matching every variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. }
            | Self::ConfigSource { .. }
            | Self::InvalidAddress(_)
            | Self::InvalidStage { .. }
            | Self::UnknownStage(_) => ErrorKind::Config,
            Self::Link { .. } => ErrorKind::Link,
            Self::Deploy { .. } | Self::ArtifactNotFound(_) => ErrorKind::Deploy,
            Self::PostAction { .. } => ErrorKind::PostAction,
            Self::RegistryConflict { .. } | Self::NotRegistered { .. } => ErrorKind::Registry,
            Self::InvalidTransition { .. } => ErrorKind::Internal,
            Self::Io(_) | Self::Yaml(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Link,
    Deploy,
    PostAction,
    Registry,
    Internal,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Link => "link",
            ErrorKind::Deploy => "deploy",
            ErrorKind::PostAction => "post_action",
            ErrorKind::Registry => "registry",
            ErrorKind::Internal => "internal",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, DeployerError>;
