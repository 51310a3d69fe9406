//! Editor-side seams: caret, selection, scrolling, folding, hints, and the find field.
//!
//! [`EditorView`] is what navigation mutates; [`SearchField`] is the host's find bar that
//! quick-find keeps in sync. [`HeadlessEditor`] and [`HeadlessSearchField`] are in-memory
//! implementations used by tests and by hosts without a UI.

use crate::NavError;
use crate::diagnostics::DiagnosticRange;
use crate::document::{NavDocument, TextDocument};
use crate::search::{MatchRange, SearchOptions};

/// How to position the viewport when scrolling to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollType {
    /// Scroll only if the target is off-screen.
    MakeVisible,
    /// Center the target; used when navigation moved the caret down.
    CenterDown,
    /// Center the target; used when navigation moved the caret up (or wrapped).
    CenterUp,
}

/// Informational messages shown as editor hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMessage {
    /// Analysis finished and found nothing to navigate to.
    NoErrorsFound,
    /// Analysis is still running; navigation will be retried when it finishes.
    AnalysisInProgress,
}

impl NavMessage {
    /// User-facing text.
    pub fn text(&self) -> &'static str {
        match self {
            NavMessage::NoErrorsFound => "No errors found in this file",
            NavMessage::AnalysisInProgress => "Error analysis is in progress",
        }
    }
}

/// The editor being navigated.
pub trait EditorView {
    /// The document shown in this editor.
    fn document(&self) -> &dyn NavDocument;

    /// Primary caret offset (chars).
    fn caret_offset(&self) -> usize;

    /// Primary selection, or `None` when the selection is empty.
    fn selection(&self) -> Option<MatchRange>;

    /// Move the primary caret.
    fn move_caret(&mut self, offset: usize);

    /// Select `start..end`, leaving the caret where it is.
    fn set_selection(&mut self, start: usize, end: usize);

    /// Clear the primary selection.
    fn remove_selection(&mut self);

    /// Drop all carets but the primary one.
    fn remove_secondary_carets(&mut self);

    /// Scroll the caret into view.
    fn scroll_to_caret(&mut self, scroll: ScrollType);

    /// Scroll `offset` into view.
    fn scroll_to_offset(&mut self, offset: usize, scroll: ScrollType);

    /// Expand the collapsed fold region covering `offset`, if any. Returns `true` if one was
    /// expanded.
    fn expand_collapsed_fold_at(&mut self, offset: usize) -> bool;

    /// Show an informational hint.
    fn show_hint(&mut self, message: NavMessage);

    /// Show the detail popup for a diagnostic the caret just moved to.
    fn show_diagnostic_tooltip(&mut self, _diagnostic: &DiagnosticRange) {}

    /// Selection bounds with an empty selection collapsed onto the caret.
    fn selection_bounds(&self) -> (usize, usize) {
        match self.selection() {
            Some(range) => (range.start, range.end),
            None => {
                let caret = self.caret_offset();
                (caret, caret)
            }
        }
    }

    /// The selected text, or `None` when the selection is empty.
    fn selected_text(&self) -> Option<String> {
        self.selection()
            .map(|range| self.document().slice(range.start, range.end))
    }
}

/// The host's find field.
pub trait SearchField {
    /// Current field text, `None` when empty.
    fn text(&self) -> Option<String>;

    /// Whether keyboard focus is inside the field.
    fn is_focused(&self) -> bool;

    /// Options configured in the field (case, whole word, regex).
    fn options(&self) -> SearchOptions;

    /// Replace the field text.
    fn set_text(&mut self, text: &str);

    /// Tell the field's own result tracking that navigation selected `range`.
    fn sync_cursor(&mut self, range: MatchRange, index: usize, total: usize)
    -> Result<(), NavError>;
}

/// Offset-based fold region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    /// Start char offset.
    pub start: usize,
    /// End char offset (exclusive).
    pub end: usize,
    /// Whether folded.
    pub is_collapsed: bool,
    /// Placeholder text shown when folded (e.g., "[...]")
    pub placeholder: String,
}

impl FoldRegion {
    /// Create an expanded region.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            is_collapsed: false,
            placeholder: String::from("[...]"),
        }
    }

    /// Create a collapsed region.
    pub fn collapsed(start: usize, end: usize) -> Self {
        Self {
            is_collapsed: true,
            ..Self::new(start, end)
        }
    }

    /// A caret at `offset` would be hidden by this region when collapsed.
    pub fn hides(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }
}

/// A recorded scroll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    /// Target offset.
    pub offset: usize,
    /// Requested positioning.
    pub scroll: ScrollType,
}

/// In-memory [`EditorView`] over a [`TextDocument`].
pub struct HeadlessEditor {
    document: TextDocument,
    caret: usize,
    selection: Option<MatchRange>,
    secondary_carets: Vec<usize>,
    folds: Vec<FoldRegion>,
    scrolls: Vec<ScrollRequest>,
    hints: Vec<NavMessage>,
    tooltips: Vec<DiagnosticRange>,
}

impl HeadlessEditor {
    /// Create an editor over `text` with the caret at 0.
    pub fn new(text: &str) -> Self {
        Self::with_document(TextDocument::new(text))
    }

    /// Create an editor over an existing document.
    pub fn with_document(document: TextDocument) -> Self {
        Self {
            document,
            caret: 0,
            selection: None,
            secondary_carets: Vec::new(),
            folds: Vec::new(),
            scrolls: Vec::new(),
            hints: Vec::new(),
            tooltips: Vec::new(),
        }
    }

    /// Mutable access to the document, for edits.
    pub fn document_mut(&mut self) -> &mut TextDocument {
        &mut self.document
    }

    /// Swap the shown document, returning the previous one. Caret and selection reset.
    pub fn replace_document(&mut self, document: TextDocument) -> TextDocument {
        self.caret = 0;
        self.selection = None;
        self.secondary_carets.clear();
        self.folds.clear();
        std::mem::replace(&mut self.document, document)
    }

    /// Add a secondary caret.
    pub fn add_secondary_caret(&mut self, offset: usize) {
        self.secondary_carets.push(offset.min(self.document.len_chars()));
    }

    /// Secondary carets.
    pub fn secondary_carets(&self) -> &[usize] {
        &self.secondary_carets
    }

    /// Add a fold region.
    pub fn add_fold(&mut self, region: FoldRegion) {
        let pos = self.folds.partition_point(|r| r.start <= region.start);
        self.folds.insert(pos, region);
    }

    /// Fold regions, sorted by start.
    pub fn folds(&self) -> &[FoldRegion] {
        &self.folds
    }

    /// Scroll requests issued so far.
    pub fn scrolls(&self) -> &[ScrollRequest] {
        &self.scrolls
    }

    /// Hints shown so far.
    pub fn hints(&self) -> &[NavMessage] {
        &self.hints
    }

    /// Tooltips shown so far.
    pub fn tooltips(&self) -> &[DiagnosticRange] {
        &self.tooltips
    }

    /// Select `start..end` and put the caret at `caret`, as a user drag would.
    pub fn select(&mut self, start: usize, end: usize, caret: usize) {
        self.move_caret(caret);
        self.set_selection(start, end);
    }
}

impl EditorView for HeadlessEditor {
    fn document(&self) -> &dyn NavDocument {
        &self.document
    }

    fn caret_offset(&self) -> usize {
        self.caret
    }

    fn selection(&self) -> Option<MatchRange> {
        self.selection
    }

    fn move_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.document.len_chars());
        self.selection = None;
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.document.len_chars();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        self.selection = (start < end).then_some(MatchRange::new(start, end));
    }

    fn remove_selection(&mut self) {
        self.selection = None;
    }

    fn remove_secondary_carets(&mut self) {
        self.secondary_carets.clear();
    }

    fn scroll_to_caret(&mut self, scroll: ScrollType) {
        self.scrolls.push(ScrollRequest {
            offset: self.caret,
            scroll,
        });
    }

    fn scroll_to_offset(&mut self, offset: usize, scroll: ScrollType) {
        self.scrolls.push(ScrollRequest { offset, scroll });
    }

    fn expand_collapsed_fold_at(&mut self, offset: usize) -> bool {
        match self
            .folds
            .iter_mut()
            .find(|r| r.is_collapsed && r.hides(offset))
        {
            Some(region) => {
                region.is_collapsed = false;
                true
            }
            None => false,
        }
    }

    fn show_hint(&mut self, message: NavMessage) {
        self.hints.push(message);
    }

    fn show_diagnostic_tooltip(&mut self, diagnostic: &DiagnosticRange) {
        self.tooltips.push(diagnostic.clone());
    }
}

/// In-memory [`SearchField`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessSearchField {
    /// Field text.
    pub text: String,
    /// Whether the field has keyboard focus.
    pub focused: bool,
    /// Field options.
    pub options: SearchOptions,
    /// Make `sync_cursor` fail, to exercise host-failure handling.
    pub fail_sync: bool,
    /// Last cursor reported through `sync_cursor`.
    pub cursor: Option<(MatchRange, usize, usize)>,
}

impl HeadlessSearchField {
    /// An unfocused empty field with default options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchField for HeadlessSearchField {
    fn text(&self) -> Option<String> {
        (!self.text.is_empty()).then(|| self.text.clone())
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn options(&self) -> SearchOptions {
        self.options
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn sync_cursor(
        &mut self,
        range: MatchRange,
        index: usize,
        total: usize,
    ) -> Result<(), NavError> {
        if self.fail_sync {
            return Err(NavError::Host("find field rejected cursor update".to_string()));
        }
        self.cursor = Some((range, index, total));
        Ok(())
    }
}
