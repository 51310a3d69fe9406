//! `textDocument/publishDiagnostics` parsing and coordinate conversion.
//!
//! LSP positions are `(line, UTF-16 code unit)` pairs; navigation works in char offsets. The
//! conversion goes through a [`Rope`] of the document text so it stays `O(log n)` per position.

use crate::LspBridgeError;
use editor_nav::{DiagnosticRange, Severity};
use ropey::Rope;
use serde_json::Value;
use tracing::debug;

/// The method name of the notification this module understands.
pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";

/// LSP position (UTF-16 based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspPosition {
    /// Line number (0-based).
    pub line: u32,
    /// Character offset in UTF-16 code units (0-based).
    pub character: u32,
}

impl LspPosition {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// LSP range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspRange {
    /// Range start (inclusive).
    pub start: LspPosition,
    /// Range end (exclusive).
    pub end: LspPosition,
}

impl LspRange {
    /// Create a new range.
    pub fn new(start: LspPosition, end: LspPosition) -> Self {
        Self { start, end }
    }
}

/// Severity levels of `publishDiagnostics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LspDiagnosticSeverity {
    /// `1`
    Error,
    /// `2`
    Warning,
    /// `3`
    Information,
    /// `4`
    Hint,
}

/// Severity assigned to LSP hints; below [`Severity::INFORMATION`].
pub const HINT: Severity = Severity::new_static("HINT", 5);

impl LspDiagnosticSeverity {
    /// Convert the numeric LSP `DiagnosticSeverity`.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }

    /// The navigation severity for this level.
    pub fn severity(self) -> Severity {
        match self {
            Self::Error => Severity::ERROR,
            Self::Warning => Severity::WARNING,
            Self::Information => Severity::INFORMATION,
            Self::Hint => HINT,
        }
    }
}

/// One diagnostic of a `publishDiagnostics` notification.
#[derive(Debug, Clone, PartialEq)]
pub struct LspDiagnostic {
    /// Diagnostic range.
    pub range: LspRange,
    /// Severity; servers may omit it.
    pub severity: Option<LspDiagnosticSeverity>,
    /// Diagnostic code (number or string).
    pub code: Option<String>,
    /// Producer, e.g. `"rust-analyzer"`.
    pub source: Option<String>,
    /// Message text.
    pub message: String,
}

impl LspDiagnostic {
    /// Severity used for navigation. Diagnostics without one are treated as errors.
    pub fn effective_severity(&self) -> Severity {
        self.severity
            .map(LspDiagnosticSeverity::severity)
            .unwrap_or(Severity::ERROR)
    }

    /// Tooltip text: `source[code]: message`, omitting absent parts.
    pub fn display_message(&self) -> String {
        match (&self.source, &self.code) {
            (Some(source), Some(code)) => format!("{source}[{code}]: {}", self.message),
            (Some(source), None) => format!("{source}: {}", self.message),
            (None, Some(code)) => format!("[{code}]: {}", self.message),
            (None, None) => self.message.clone(),
        }
    }
}

/// Parameters of `textDocument/publishDiagnostics`.
#[derive(Debug, Clone, PartialEq)]
pub struct LspPublishDiagnosticsParams {
    /// Document URI.
    pub uri: String,
    /// Document version the diagnostics were computed for.
    pub version: Option<i32>,
    /// The diagnostics; replaces everything published earlier for `uri`.
    pub diagnostics: Vec<LspDiagnostic>,
}

fn position_from_value(value: &Value) -> Option<LspPosition> {
    let line = u32::try_from(value.get("line")?.as_u64()?).ok()?;
    let character = u32::try_from(value.get("character")?.as_u64()?).ok()?;
    Some(LspPosition { line, character })
}

fn range_from_value(value: &Value) -> Option<LspRange> {
    let start = position_from_value(value.get("start")?)?;
    let end = position_from_value(value.get("end")?)?;
    Some(LspRange { start, end })
}

fn code_from_value(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn diagnostic_from_value(value: &Value) -> Option<LspDiagnostic> {
    let range = range_from_value(value.get("range")?)?;
    let severity = value
        .get("severity")
        .and_then(Value::as_u64)
        .and_then(LspDiagnosticSeverity::from_u64);
    let source = value
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Some(LspDiagnostic {
        range,
        severity,
        code: code_from_value(value.get("code")),
        source,
        message,
    })
}

impl LspPublishDiagnosticsParams {
    /// Parse the `params` object of the notification.
    ///
    /// Individual diagnostics with a malformed range are skipped.
    pub fn from_params(params: &Value) -> Result<Self, LspBridgeError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or(LspBridgeError::MissingField("uri"))?
            .to_string();
        let version = params
            .get("version")
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok());
        let entries = params
            .get("diagnostics")
            .and_then(Value::as_array)
            .ok_or(LspBridgeError::MissingField("diagnostics"))?;

        let diagnostics: Vec<_> = entries.iter().filter_map(diagnostic_from_value).collect();
        if diagnostics.len() != entries.len() {
            debug!(
                uri = %uri,
                skipped = entries.len() - diagnostics.len(),
                "skipped malformed diagnostics"
            );
        }

        Ok(Self {
            uri,
            version,
            diagnostics,
        })
    }

    /// Parse a full JSON-RPC notification message.
    pub fn from_message(message: &Value) -> Result<Self, LspBridgeError> {
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .ok_or(LspBridgeError::MissingField("method"))?;
        if method != PUBLISH_DIAGNOSTICS {
            return Err(LspBridgeError::UnexpectedMethod(method.to_string()));
        }
        let params = message
            .get("params")
            .ok_or(LspBridgeError::MissingField("params"))?;
        Self::from_params(params)
    }

    /// Parse a JSON-RPC notification from its raw text.
    pub fn from_message_str(message: &str) -> Result<Self, LspBridgeError> {
        let value: Value = serde_json::from_str(message)?;
        Self::from_message(&value)
    }
}

/// Char offset of an LSP position in `rope`.
///
/// Lines past the end map to the document length; characters past the end of their line clamp
/// to the line end (before the line break), as LSP prescribes.
pub fn char_offset_for_lsp_position(rope: &Rope, position: LspPosition) -> usize {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return rope.len_chars();
    }

    let line_start = rope.line_to_char(line);
    let line_slice = rope.line(line);
    let mut content_len = line_slice.len_chars();
    if content_len > 0 && line_slice.char(content_len - 1) == '\n' {
        content_len -= 1;
        if content_len > 0 && line_slice.char(content_len - 1) == '\r' {
            content_len -= 1;
        }
    }

    let line_start_cu = rope.char_to_utf16_cu(line_start);
    let line_end_cu = rope.char_to_utf16_cu(line_start + content_len);
    let target_cu = (line_start_cu + position.character as usize).min(line_end_cu);
    rope.utf16_cu_to_char(target_cu)
}

/// Convert one diagnostic to a navigation range over `rope`.
///
/// Zero-width diagnostics are kept (servers use them for "missing token" errors at line ends).
pub fn to_diagnostic_range(rope: &Rope, diagnostic: &LspDiagnostic) -> DiagnosticRange {
    let start = char_offset_for_lsp_position(rope, diagnostic.range.start);
    let end = char_offset_for_lsp_position(rope, diagnostic.range.end);
    let (start, end) = (start.min(end), start.max(end));
    DiagnosticRange::new(start, end, diagnostic.effective_severity())
        .with_message(diagnostic.display_message())
}
