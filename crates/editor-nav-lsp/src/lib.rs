#![warn(missing_docs)]
//! `editor-nav-lsp` - LSP diagnostics for `editor-nav` error navigation.
//!
//! Parses `textDocument/publishDiagnostics` notifications, converts their UTF-16 positions to
//! char offsets, and serves the result through [`editor_nav::DiagnosticsProvider`] so "go to next
//! error" works against a language server.

mod error;
pub mod lsp_diagnostics;
pub mod provider;

pub use error::LspBridgeError;
pub use lsp_diagnostics::{
    HINT, LspDiagnostic, LspDiagnosticSeverity, LspPosition, LspPublishDiagnosticsParams,
    LspRange, PUBLISH_DIAGNOSTICS, char_offset_for_lsp_position, to_diagnostic_range,
};
pub use provider::LspDiagnosticsProvider;
