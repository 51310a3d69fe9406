//! Diagnostics as seen by error navigation.
//!
//! Diagnostics are produced elsewhere (an analysis daemon, an LSP server); navigation only
//! ranks them. A [`DiagnosticsProvider`] exposes:
//! - an ordered list of severity tiers (tier 0 is reserved and never navigated to)
//! - a visitor over every diagnostic at or above a severity
//! - a per-severity eligibility predicate for "go to next error"
//! - whether analysis of the current document has finished

use crate::events::{AnalysisFinished, ListenerSet, Subscription};
use std::borrow::Cow;

/// A diagnostic severity. Higher `value` means more severe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Severity {
    /// Display name, e.g. `"ERROR"`.
    pub name: Cow<'static, str>,
    /// Ordering weight.
    pub value: u32,
}

impl Severity {
    /// Informational diagnostics.
    pub const INFORMATION: Severity = Severity::new_static("INFORMATION", 10);
    /// Weak warnings (typos, style).
    pub const WEAK_WARNING: Severity = Severity::new_static("WEAK_WARNING", 200);
    /// Warnings.
    pub const WARNING: Severity = Severity::new_static("WARNING", 300);
    /// Errors.
    pub const ERROR: Severity = Severity::new_static("ERROR", 400);

    /// Create a severity with a static name.
    pub const fn new_static(name: &'static str, value: u32) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value,
        }
    }

    /// Create a severity with an owned name.
    pub fn new(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            value,
        }
    }

    /// Returns `true` when `self` is at least as severe as `floor`.
    pub fn is_at_least(&self, floor: &Severity) -> bool {
        self.value >= floor.value
    }
}

/// Ordered severity tiers, least severe first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityRegistry {
    tiers: Vec<Severity>,
}

impl SeverityRegistry {
    /// Build a registry from tiers in any order; they are sorted by value and deduplicated.
    pub fn new(mut tiers: Vec<Severity>) -> Self {
        tiers.sort_by_key(|s| s.value);
        tiers.dedup_by_key(|s| s.value);
        Self { tiers }
    }

    /// `INFORMATION < WEAK_WARNING < WARNING < ERROR`.
    pub fn standard() -> Self {
        Self::new(vec![
            Severity::INFORMATION,
            Severity::WEAK_WARNING,
            Severity::WARNING,
            Severity::ERROR,
        ])
    }

    /// Number of tiers (including the reserved tier 0).
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// The severity at `tier`, if any.
    pub fn severity_at(&self, tier: usize) -> Option<&Severity> {
        self.tiers.get(tier)
    }

    /// The tier index of `severity`, if registered.
    pub fn tier_of(&self, severity: &Severity) -> Option<usize> {
        self.tiers.iter().position(|s| s.value == severity.value)
    }
}

impl Default for SeverityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// A diagnostic highlight range, in char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRange {
    /// Range start offset (inclusive).
    pub start: usize,
    /// Range end offset (exclusive).
    pub end: usize,
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// The diagnostic is rendered after the end of its line (e.g. "missing semicolon").
    pub after_end_of_line: bool,
    /// Caret shift applied to after-end-of-line diagnostics when navigating to them.
    pub navigation_shift: usize,
    /// Optional message, shown in the navigation tooltip.
    pub message: Option<String>,
}

impl DiagnosticRange {
    /// Create a diagnostic over `start..end`.
    pub fn new(start: usize, end: usize, severity: Severity) -> Self {
        Self {
            start,
            end,
            severity,
            after_end_of_line: false,
            navigation_shift: 0,
            message: None,
        }
    }

    /// Mark this diagnostic as rendered after the end of its line, with the given caret shift.
    pub fn after_end_of_line(mut self, navigation_shift: usize) -> Self {
        self.after_end_of_line = true;
        self.navigation_shift = navigation_shift;
        self
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Default eligibility rule: every severity except [`Severity::INFORMATION`] takes part in
/// severity-based navigation.
pub fn default_navigation_eligibility(severity: &Severity) -> bool {
    severity.value != Severity::INFORMATION.value
}

/// Source of diagnostics for error navigation.
pub trait DiagnosticsProvider {
    /// Number of severity tiers, including the reserved tier 0.
    fn severity_tier_count(&self) -> usize;

    /// The severity at `tier`, or `None` when the tier is unknown.
    fn severity_at(&self, tier: usize) -> Option<Severity>;

    /// Whether diagnostics of `severity` take part in severity-based navigation.
    fn is_navigation_eligible(&self, severity: &Severity) -> bool {
        default_navigation_eligibility(severity)
    }

    /// Visit every diagnostic at or above `min_severity` overlapping `start..end`.
    ///
    /// The visitor returns `false` to stop the scan early.
    fn diagnostics_in_range(
        &self,
        min_severity: &Severity,
        start: usize,
        end: usize,
        visitor: &mut dyn FnMut(&DiagnosticRange) -> bool,
    );

    /// `false` while analysis of the current document is still running.
    fn is_analysis_finished(&self) -> bool;

    /// Subscribe to "analysis finished" notifications.
    fn subscribe_analysis_finished(
        &self,
        listener: Box<dyn FnMut(&AnalysisFinished) + Send>,
    ) -> Subscription;
}

/// In-memory [`DiagnosticsProvider`].
pub struct DiagnosticStore {
    registry: SeverityRegistry,
    diagnostics: Vec<DiagnosticRange>,
    eligibility: Box<dyn Fn(&Severity) -> bool + Send>,
    analysis_finished: bool,
    finished_listeners: ListenerSet<AnalysisFinished>,
}

impl DiagnosticStore {
    /// Create an empty store with the standard severity tiers. Analysis counts as finished.
    pub fn new() -> Self {
        Self::with_registry(SeverityRegistry::standard())
    }

    /// Create an empty store with custom tiers.
    pub fn with_registry(registry: SeverityRegistry) -> Self {
        Self {
            registry,
            diagnostics: Vec::new(),
            eligibility: Box::new(default_navigation_eligibility),
            analysis_finished: true,
            finished_listeners: ListenerSet::new(),
        }
    }

    /// Replace the navigation-eligibility predicate.
    pub fn set_eligibility<F>(&mut self, predicate: F)
    where
        F: Fn(&Severity) -> bool + Send + 'static,
    {
        self.eligibility = Box::new(predicate);
    }

    /// Replace all diagnostics. Kept sorted by start offset.
    pub fn replace(&mut self, mut diagnostics: Vec<DiagnosticRange>) {
        diagnostics.sort_by_key(|d| (d.start, d.end));
        self.diagnostics = diagnostics;
    }

    /// Add one diagnostic.
    pub fn push(&mut self, diagnostic: DiagnosticRange) {
        let pos = self
            .diagnostics
            .partition_point(|d| (d.start, d.end) <= (diagnostic.start, diagnostic.end));
        self.diagnostics.insert(pos, diagnostic);
    }

    /// Remove all diagnostics.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// All diagnostics, sorted by start offset.
    pub fn diagnostics(&self) -> &[DiagnosticRange] {
        &self.diagnostics
    }

    /// The severity tiers.
    pub fn registry(&self) -> &SeverityRegistry {
        &self.registry
    }

    /// Mark analysis as running.
    pub fn begin_analysis(&mut self) {
        self.analysis_finished = false;
    }

    /// Mark analysis as finished and notify listeners.
    pub fn finish_analysis(&mut self) {
        self.analysis_finished = true;
        self.finished_listeners.emit(&AnalysisFinished);
    }

    /// Number of listeners waiting for analysis to finish.
    pub fn analysis_listener_count(&self) -> usize {
        self.finished_listeners.len()
    }
}

impl Default for DiagnosticStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsProvider for DiagnosticStore {
    fn severity_tier_count(&self) -> usize {
        self.registry.tier_count()
    }

    fn severity_at(&self, tier: usize) -> Option<Severity> {
        self.registry.severity_at(tier).cloned()
    }

    fn is_navigation_eligible(&self, severity: &Severity) -> bool {
        (self.eligibility)(severity)
    }

    fn diagnostics_in_range(
        &self,
        min_severity: &Severity,
        start: usize,
        end: usize,
        visitor: &mut dyn FnMut(&DiagnosticRange) -> bool,
    ) {
        for diagnostic in &self.diagnostics {
            if diagnostic.start > end {
                break;
            }
            if diagnostic.end < start || !diagnostic.severity.is_at_least(min_severity) {
                continue;
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_orders_tiers_by_value() {
        let registry = SeverityRegistry::new(vec![
            Severity::ERROR,
            Severity::INFORMATION,
            Severity::WARNING,
        ]);
        assert_eq!(registry.tier_count(), 3);
        assert_eq!(registry.severity_at(0), Some(&Severity::INFORMATION));
        assert_eq!(registry.severity_at(2), Some(&Severity::ERROR));
        assert_eq!(registry.tier_of(&Severity::WARNING), Some(1));
    }

    #[test]
    fn test_store_visits_at_or_above_severity_in_offset_order() {
        let mut store = DiagnosticStore::new();
        store.push(DiagnosticRange::new(30, 31, Severity::WARNING));
        store.push(DiagnosticRange::new(10, 11, Severity::ERROR));
        store.push(DiagnosticRange::new(20, 21, Severity::INFORMATION));

        let mut seen = Vec::new();
        store.diagnostics_in_range(&Severity::WARNING, 0, 100, &mut |d| {
            seen.push(d.start);
            true
        });
        assert_eq!(seen, vec![10, 30]);
    }

    #[test]
    fn test_default_eligibility_excludes_information() {
        let store = DiagnosticStore::new();
        assert!(!store.is_navigation_eligible(&Severity::INFORMATION));
        assert!(store.is_navigation_eligible(&Severity::WEAK_WARNING));
    }
}
