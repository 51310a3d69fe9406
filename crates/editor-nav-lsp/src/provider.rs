//! A [`DiagnosticsProvider`] fed by `publishDiagnostics` notifications.

use crate::LspBridgeError;
use crate::lsp_diagnostics::{HINT, LspPublishDiagnosticsParams, to_diagnostic_range};
use editor_nav::{
    AnalysisFinished, DiagnosticRange, DiagnosticsProvider, ListenerSet, Severity,
    SeverityRegistry, Subscription, default_navigation_eligibility,
};
use ropey::Rope;
use serde_json::Value;
use tracing::debug;

/// Diagnostics of one LSP document, ready for error navigation.
///
/// Tiers are `[HINT, INFORMATION, WARNING, ERROR]`; hints sit in the reserved tier 0 and are
/// never navigated to, and informational diagnostics are not navigation-eligible.
///
/// Analysis counts as running between [`begin_analysis`](Self::begin_analysis) (call it after
/// sending `didChange`) and the next accepted publish.
pub struct LspDiagnosticsProvider {
    uri: String,
    rope: Rope,
    registry: SeverityRegistry,
    diagnostics: Vec<DiagnosticRange>,
    last_version: Option<i32>,
    analysis_finished: bool,
    finished_listeners: ListenerSet<AnalysisFinished>,
}

impl LspDiagnosticsProvider {
    /// A provider for `uri` whose current text is `text`. Analysis starts out pending.
    pub fn new(uri: impl Into<String>, text: &str) -> Self {
        Self {
            uri: uri.into(),
            rope: Rope::from_str(text),
            registry: SeverityRegistry::new(vec![
                HINT,
                Severity::INFORMATION,
                Severity::WARNING,
                Severity::ERROR,
            ]),
            diagnostics: Vec::new(),
            last_version: None,
            analysis_finished: false,
            finished_listeners: ListenerSet::new(),
        }
    }

    /// Document URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Version of the last accepted publish.
    pub fn last_version(&self) -> Option<i32> {
        self.last_version
    }

    /// Current diagnostics, sorted by start offset.
    pub fn diagnostics(&self) -> &[DiagnosticRange] {
        &self.diagnostics
    }

    /// Replace the text positions are resolved against, and mark analysis as pending.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.begin_analysis();
    }

    /// Mark analysis as running; "next error" requests made now are deferred.
    pub fn begin_analysis(&mut self) {
        self.analysis_finished = false;
    }

    /// Accept a publish. Returns `false` when it was ignored (other URI or stale version).
    pub fn publish(&mut self, params: &LspPublishDiagnosticsParams) -> bool {
        if params.uri != self.uri {
            debug!(uri = %params.uri, expected = %self.uri, "ignoring diagnostics for other document");
            return false;
        }
        if let (Some(version), Some(last)) = (params.version, self.last_version)
            && version < last
        {
            debug!(version, last, "ignoring stale diagnostics");
            return false;
        }

        let mut diagnostics: Vec<_> = params
            .diagnostics
            .iter()
            .map(|d| to_diagnostic_range(&self.rope, d))
            .collect();
        diagnostics.sort_by_key(|d| (d.start, d.end));
        self.diagnostics = diagnostics;
        if params.version.is_some() {
            self.last_version = params.version;
        }
        self.analysis_finished = true;
        debug!(
            uri = %self.uri,
            version = ?params.version,
            count = self.diagnostics.len(),
            "accepted diagnostics"
        );
        self.finished_listeners.emit(&AnalysisFinished);
        true
    }

    /// Parse and accept a JSON-RPC `publishDiagnostics` notification.
    pub fn handle_notification(&mut self, message: &Value) -> Result<bool, LspBridgeError> {
        let params = LspPublishDiagnosticsParams::from_message(message)?;
        Ok(self.publish(&params))
    }
}

impl DiagnosticsProvider for LspDiagnosticsProvider {
    fn severity_tier_count(&self) -> usize {
        self.registry.tier_count()
    }

    fn severity_at(&self, tier: usize) -> Option<Severity> {
        self.registry.severity_at(tier).cloned()
    }

    fn is_navigation_eligible(&self, severity: &Severity) -> bool {
        default_navigation_eligibility(severity)
    }

    fn diagnostics_in_range(
        &self,
        min_severity: &Severity,
        start: usize,
        end: usize,
        visitor: &mut dyn FnMut(&DiagnosticRange) -> bool,
    ) {
        let overlapping = self
            .diagnostics
            .iter()
            .take_while(|d| d.start <= end)
            .filter(|d| d.end >= start && d.severity.is_at_least(min_severity));
        for diagnostic in overlapping {
            if !visitor(diagnostic) {
                return;
            }
        }
    }

    fn is_analysis_finished(&self) -> bool {
        self.analysis_finished
    }

    fn subscribe_analysis_finished(
        &self,
        listener: Box<dyn FnMut(&AnalysisFinished) + Send>,
    ) -> Subscription {
        self.finished_listeners.subscribe(listener)
    }
}
