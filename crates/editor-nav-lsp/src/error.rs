use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while turning LSP payloads into navigable diagnostics.
pub enum LspBridgeError {
    #[error("invalid JSON-RPC message: {0}")]
    /// The raw message was not valid JSON.
    Json(#[from] serde_json::Error),

    #[error("unexpected method `{0}`, expected textDocument/publishDiagnostics")]
    /// The message is a notification for a different method.
    UnexpectedMethod(String),

    #[error("missing or malformed field `{0}`")]
    /// A required field was absent or had the wrong type.
    MissingField(&'static str),
}
