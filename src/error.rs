/// Failures of the secure local store and the files written through it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("envelope is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("envelope too short ({0} bytes)")]
    Truncated(usize),

    #[error("integrity check failed, data may have been tampered with")]
    Integrity,

    #[error("decryption failed")]
    Decrypt,

    #[error("encryption failed")]
    Encrypt,

    #[error("invalid key material")]
    Key,
}

/// Rejected custom snippet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnippetError {
    #[error("snippet is empty")]
    Empty,

    #[error("snippet must be at least {min} characters")]
    TooShort { min: usize },

    #[error("snippet already exists")]
    Duplicate,

    #[error("invalid format, expected a JSON array of strings")]
    InvalidFormat,
}

/// Export of an empty dataset
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("no {what} to export")]
    Empty { what: &'static str },
}

/// Sound backend failure; never surfaced past the audio manager
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    Unavailable(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
