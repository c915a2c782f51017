use thiserror::Error;

/// Errors raised while binding a credential to a git run.
///
/// No variant ever carries key text or a passphrase.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("Key decode error: {0}")]
    KeyDecode(String),

    #[error("I/O error: {0}")]
    Environment(#[from] std::io::Error),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Credential holds no private key")]
    MissingKey,

    #[error("Git client error: {0}")]
    GitClient(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BindError {
    pub(crate) fn key_decode(context: &str, err: impl std::fmt::Display) -> Self {
        BindError::KeyDecode(format!("{context}: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, BindError>;
