//! Per-editor navigation session.
//!
//! A [`NavigationSession`] owns the quick-find [`MatchTracker`], the [`ErrorNavigator`] and the
//! settings, and wires them to the host through a [`NavContext`]. It binds itself to whatever
//! document the editor currently shows: switching documents re-subscribes to edit
//! notifications and forces a cache rebuild.

use crate::NavError;
use crate::commands::{NavCommand, NavResult};
use crate::config::NavSettings;
use crate::diagnostics::DiagnosticsProvider;
use crate::document::{DocumentId, NavDocument};
use crate::editor::{EditorView, SearchField};
use crate::error_nav::{ErrorNavOutcome, ErrorNavigator};
use crate::events::{ListenerSet, NavEvent, Subscription};
use crate::match_tracker::{AdvanceRequest, Direction, MatchTracker};
use crate::search::{SearchFingerprint, SearchPrimitive, terms_differ};
use crate::word::word_range_at;
use tracing::{debug, warn};

/// Host services a command runs against.
pub struct NavContext<'a> {
    /// The editor to navigate.
    pub editor: &'a mut dyn EditorView,
    /// Search primitive used to (re)build the match cache.
    pub search: &'a mut dyn SearchPrimitive,
    /// Diagnostics source for error navigation.
    pub diagnostics: &'a dyn DiagnosticsProvider,
    /// The host's find field, when it has one.
    pub search_field: Option<&'a mut dyn SearchField>,
}

impl<'a> NavContext<'a> {
    /// A context without a find field.
    pub fn new(
        editor: &'a mut dyn EditorView,
        search: &'a mut dyn SearchPrimitive,
        diagnostics: &'a dyn DiagnosticsProvider,
    ) -> Self {
        Self {
            editor,
            search,
            diagnostics,
            search_field: None,
        }
    }

    /// Attach the host's find field.
    pub fn with_search_field(mut self, field: &'a mut dyn SearchField) -> Self {
        self.search_field = Some(field);
        self
    }
}

/// Which term the next quick-find step searches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermResolution {
    /// Term taken from the find field or the selection. `None` means "reuse the last term".
    pub term: Option<String>,
    /// The find field text is stale and should be overwritten.
    pub sync_field: bool,
}

/// Pick the search term from the selection, the find field and the last term.
///
/// - A focused, non-empty field wins over the selection.
/// - An unfocused field is used only when nothing is selected and its text differs from the
///   last term.
/// - Otherwise the selection is used, and the field is flagged stale when its text differs
///   from the term that will be searched.
/// - An empty field is flagged stale whenever there is a last term to show.
pub fn resolve_search_term(
    selected: Option<String>,
    field_text: Option<String>,
    field_focused: bool,
    last_term: Option<&str>,
    case_sensitive: bool,
) -> TermResolution {
    let mut sync_field = field_text.is_none() && last_term.is_some();
    let mut term = selected;

    if let Some(field) = field_text {
        if field_focused {
            term = Some(field);
        } else if term.is_none() && differs(case_sensitive, &field, last_term) {
            term = Some(field);
        } else {
            let shown = term.as_deref().or(last_term);
            if shown.is_some() && differs(case_sensitive, &field, shown) {
                sync_field = true;
            }
        }
    }

    TermResolution { term, sync_field }
}

fn differs(case_sensitive: bool, text: &str, other: Option<&str>) -> bool {
    other.is_none_or(|other| terms_differ(case_sensitive, text, other))
}

struct BoundDocument {
    id: DocumentId,
    _changes: Subscription,
}

/// Quick-find and error navigation for one editor.
pub struct NavigationSession {
    settings: NavSettings,
    tracker: MatchTracker,
    errors: ErrorNavigator,
    bound: Option<BoundDocument>,
    last_term: Option<String>,
    listeners: ListenerSet<NavEvent>,
}

impl NavigationSession {
    /// A session with no document bound and no search history.
    pub fn new(settings: NavSettings) -> Self {
        Self {
            settings,
            tracker: MatchTracker::new(),
            errors: ErrorNavigator::new(),
            bound: None,
            last_term: None,
            listeners: ListenerSet::new(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    /// Replace the settings. Takes effect on the next command.
    pub fn set_settings(&mut self, settings: NavSettings) {
        self.settings = settings;
    }

    /// The quick-find tracker.
    pub fn tracker(&self) -> &MatchTracker {
        &self.tracker
    }

    /// The term the match cache was last built for.
    pub fn last_search_term(&self) -> Option<&str> {
        self.last_term.as_deref()
    }

    /// Whether a "next error" request is waiting for analysis to finish.
    pub fn has_deferred_error_navigation(&self) -> bool {
        self.errors.has_pending()
    }

    /// Listen to navigation events.
    #[must_use = "dropping the subscription unsubscribes the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&NavEvent) + Send + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Run `command`.
    pub fn execute(
        &mut self,
        command: NavCommand,
        ctx: &mut NavContext<'_>,
    ) -> Result<NavResult, NavError> {
        match command {
            NavCommand::NextMatch => self.find_match(ctx, Direction::Forward),
            NavCommand::PreviousMatch => self.find_match(ctx, Direction::Backward),
            NavCommand::NextDiagnostic => Ok(self.goto_diagnostic(ctx, Direction::Forward)),
            NavCommand::PreviousDiagnostic => Ok(self.goto_diagnostic(ctx, Direction::Backward)),
            NavCommand::SelectWordAtCaret => Ok(self.select_word_at_caret(ctx)),
        }
    }

    /// Select the next occurrence of the search term.
    pub fn next_match(&mut self, ctx: &mut NavContext<'_>) -> Result<NavResult, NavError> {
        self.find_match(ctx, Direction::Forward)
    }

    /// Select the previous occurrence of the search term.
    pub fn previous_match(&mut self, ctx: &mut NavContext<'_>) -> Result<NavResult, NavError> {
        self.find_match(ctx, Direction::Backward)
    }

    /// Move to the next diagnostic.
    pub fn next_diagnostic(&mut self, ctx: &mut NavContext<'_>) -> NavResult {
        self.goto_diagnostic(ctx, Direction::Forward)
    }

    /// Move to the previous diagnostic.
    pub fn previous_diagnostic(&mut self, ctx: &mut NavContext<'_>) -> NavResult {
        self.goto_diagnostic(ctx, Direction::Backward)
    }

    fn bind_document(&mut self, document: &dyn NavDocument) {
        let id = document.id();
        if self.bound.as_ref().is_some_and(|bound| bound.id == id) {
            return;
        }

        let dirty = self.tracker.dirty_flag();
        let changes = document.subscribe_changes(Box::new(move |_| dirty.mark()));
        // Replacing drops the subscription to the previous document.
        self.bound = Some(BoundDocument {
            id,
            _changes: changes,
        });
        self.tracker.mark_dirty();
        debug!(document = id.0, "bound navigation session to document");
    }

    fn find_match(
        &mut self,
        ctx: &mut NavContext<'_>,
        direction: Direction,
    ) -> Result<NavResult, NavError> {
        self.bind_document(ctx.editor.document());

        let options = match ctx.search_field.as_deref() {
            Some(field) => field.options(),
            None => self.settings.search_options,
        };
        let (field_text, field_focused) = match ctx.search_field.as_deref() {
            Some(field) => (field.text(), field.is_focused()),
            None => (None, false),
        };

        let resolution = resolve_search_term(
            ctx.editor.selected_text(),
            field_text,
            field_focused,
            self.last_term.as_deref(),
            options.case_sensitive,
        );
        let has_search_string = resolution.term.is_some();
        let mut sync_field = resolution.sync_field;

        if let Some(term) = resolution.term {
            let candidate = SearchFingerprint::new(term, options);
            let changed = match self.tracker.cache().fingerprint() {
                Some(previous) => candidate.differs_from(previous),
                None => true,
            };
            if changed || self.last_term.is_none() {
                self.listeners.emit(&NavEvent::SearchTermChanged {
                    term: candidate.term.clone(),
                });
                self.last_term = Some(candidate.term);
                sync_field = true;
            }
        }

        let Some(term) = self.last_term.clone() else {
            return Ok(NavResult::NoSearchTerm);
        };
        let fingerprint = SearchFingerprint::new(term, options);

        let caret = ctx.editor.caret_offset();
        let (selection_start, selection_end) = ctx.editor.selection_bounds();
        let mut request =
            AdvanceRequest::new(caret, selection_start, selection_end, &fingerprint, direction);
        if !has_search_string {
            request = request.reusing_last_term();
        }

        let landing = self
            .tracker
            .advance(ctx.editor.document(), request, &mut *ctx.search)?;

        if let Some(landing) = &landing {
            ctx.editor.move_caret(landing.caret_offset());
            ctx.editor
                .set_selection(landing.range.start, landing.range.end);
        }

        if let Some(field) = ctx.search_field.as_deref_mut() {
            if sync_field {
                field.set_text(&fingerprint.term);
            }
            if let Some(landing) = &landing
                && let Err(err) = field.sync_cursor(landing.range, landing.index, landing.total)
            {
                warn!(error = %err, "failed to sync find field cursor");
            }
        }

        Ok(match landing {
            Some(landing) => {
                self.listeners.emit(&NavEvent::MatchSelected {
                    range: landing.range,
                    index: landing.index,
                    total: landing.total,
                });
                NavResult::MatchSelected {
                    start: landing.range.start,
                    end: landing.range.end,
                }
            }
            None => NavResult::NotFound,
        })
    }

    fn goto_diagnostic(&mut self, ctx: &mut NavContext<'_>, direction: Direction) -> NavResult {
        let outcome = self.errors.goto_next_error(
            &mut *ctx.editor,
            ctx.diagnostics,
            direction,
            self.settings.error_nav_options(),
        );
        self.diagnostic_result(outcome)
    }

    fn diagnostic_result(&self, outcome: ErrorNavOutcome) -> NavResult {
        match outcome {
            ErrorNavOutcome::Navigated(diagnostic) => {
                let result = NavResult::DiagnosticSelected {
                    start: diagnostic.start,
                    end: diagnostic.end,
                };
                self.listeners
                    .emit(&NavEvent::DiagnosticSelected(diagnostic));
                result
            }
            ErrorNavOutcome::NoErrorsFound => NavResult::NoErrorsFound,
            ErrorNavOutcome::AnalysisInProgress => NavResult::AnalysisInProgress,
        }
    }

    /// Retry a deferred "next error" request now that analysis finished.
    ///
    /// Returns `None` when nothing was deferred. The retry runs at most once per request.
    pub fn on_analysis_finished(&mut self, ctx: &mut NavContext<'_>) -> Option<NavResult> {
        let outcome = self.errors.retry_pending(
            &mut *ctx.editor,
            ctx.diagnostics,
            self.settings.error_nav_options(),
        )?;
        Some(self.diagnostic_result(outcome))
    }

    /// Retry the deferred request if the provider has signalled completion since it was made.
    pub fn poll_deferred(&mut self, ctx: &mut NavContext<'_>) -> Option<NavResult> {
        if !self.errors.pending_ready() {
            return None;
        }
        self.on_analysis_finished(ctx)
    }

    /// The "analysis in progress" hint was dismissed; forget the deferred request.
    pub fn on_hint_dismissed(&mut self) {
        if self.errors.has_pending() {
            debug!("deferred error navigation cancelled");
        }
        self.errors.cancel_pending();
    }

    /// Select the word under the caret without moving the caret.
    pub fn select_word_at_caret(&mut self, ctx: &mut NavContext<'_>) -> NavResult {
        let caret = ctx.editor.caret_offset();
        let word = {
            let text = ctx.editor.document().text();
            word_range_at(&text, caret)
        };
        match word {
            Some(range) => {
                ctx.editor.set_selection(range.start, range.end);
                NavResult::WordSelected {
                    start: range.start,
                    end: range.end,
                }
            }
            None => NavResult::NoWord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Option<String> {
        Some(text.to_string())
    }

    #[test]
    fn test_selection_is_the_term_when_field_is_empty() {
        let resolved = resolve_search_term(s("foo"), None, false, None, true);
        assert_eq!(resolved.term.as_deref(), Some("foo"));
        assert!(!resolved.sync_field);
    }

    #[test]
    fn test_focused_field_wins_over_selection() {
        let resolved = resolve_search_term(s("foo"), s("bar"), true, s("foo").as_deref(), true);
        assert_eq!(resolved.term.as_deref(), Some("bar"));
    }

    #[test]
    fn test_unfocused_field_used_only_without_selection() {
        let resolved = resolve_search_term(None, s("bar"), false, s("foo").as_deref(), true);
        assert_eq!(resolved.term.as_deref(), Some("bar"));

        let resolved = resolve_search_term(s("baz"), s("bar"), false, s("foo").as_deref(), true);
        assert_eq!(resolved.term.as_deref(), Some("baz"));
        assert!(resolved.sync_field);
    }

    #[test]
    fn test_unfocused_field_matching_last_term_is_reused() {
        let resolved = resolve_search_term(None, s("FOO"), false, s("foo").as_deref(), false);
        assert_eq!(resolved.term, None);
        assert!(!resolved.sync_field);

        // Case-sensitive: the field differs, so it becomes the new term.
        let resolved = resolve_search_term(None, s("FOO"), false, s("foo").as_deref(), true);
        assert_eq!(resolved.term.as_deref(), Some("FOO"));
    }

    #[test]
    fn test_empty_field_is_refilled_from_last_term() {
        let resolved = resolve_search_term(None, None, false, s("foo").as_deref(), true);
        assert_eq!(resolved.term, None);
        assert!(resolved.sync_field);

        let resolved = resolve_search_term(None, None, false, None, true);
        assert_eq!(
            resolved,
            TermResolution {
                term: None,
                sync_field: false
            }
        );
    }
}
