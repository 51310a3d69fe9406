use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by navigation commands and their supporting host pieces.
pub enum NavError {
    #[error("invalid regex: {0}")]
    /// The active search term failed to compile as a regex.
    InvalidRegex(#[from] regex::Error),

    #[error("settings parse error: {0}")]
    /// Navigation settings could not be parsed.
    Settings(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    /// Filesystem I/O failed while loading settings.
    Io(#[from] std::io::Error),

    #[error("offset {offset} is out of bounds for a document of {len} chars")]
    /// An edit or selection referenced an offset past the end of the document.
    OffsetOutOfBounds {
        /// The offending offset.
        offset: usize,
        /// Document length in chars.
        len: usize,
    },

    #[error("host integration failed: {0}")]
    /// A host-side side effect (for example find-field synchronization) failed.
    Host(String),
}
