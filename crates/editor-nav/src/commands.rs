//! Navigation commands.
//!
//! Every user-facing action is a parameterless [`NavCommand`]; the editor, caret and selection
//! it acts on come from the [`NavContext`](crate::NavContext) passed to
//! [`NavigationSession::execute`](crate::NavigationSession::execute).
//!
//! # Example
//!
//! ```rust
//! use editor_nav::{
//!     DiagnosticStore, EditorView, HeadlessEditor, NavCommand, NavContext, NavResult,
//!     NavigationSession, NavSettings, RegexSearch,
//! };
//!
//! let mut editor = HeadlessEditor::new("foo bar foo");
//! let mut search = RegexSearch::new();
//! let diagnostics = DiagnosticStore::new();
//! let mut session = NavigationSession::new(NavSettings::default());
//!
//! // Select the first "foo", then jump to the next occurrence.
//! editor.select(0, 3, 3);
//! let result = session
//!     .execute(
//!         NavCommand::NextMatch,
//!         &mut NavContext::new(&mut editor, &mut search, &diagnostics),
//!     )
//!     .unwrap();
//! assert_eq!(result, NavResult::MatchSelected { start: 8, end: 11 });
//! assert_eq!(editor.caret_offset(), 11);
//! ```

use crate::match_tracker::Direction;

/// A navigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavCommand {
    /// Select the next occurrence of the search term.
    NextMatch,
    /// Select the previous occurrence of the search term.
    PreviousMatch,
    /// Move to the next diagnostic.
    NextDiagnostic,
    /// Move to the previous diagnostic.
    PreviousDiagnostic,
    /// Select the word under the caret.
    SelectWordAtCaret,
}

impl NavCommand {
    /// Direction of travel, for the four directional commands.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            NavCommand::NextMatch | NavCommand::NextDiagnostic => Some(Direction::Forward),
            NavCommand::PreviousMatch | NavCommand::PreviousDiagnostic => {
                Some(Direction::Backward)
            }
            NavCommand::SelectWordAtCaret => None,
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavResult {
    /// A search match was selected (char offsets, half-open).
    MatchSelected {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// The search term has no match in the document.
    NotFound,
    /// Nothing is selected and there is no earlier search term to reuse.
    NoSearchTerm,
    /// A diagnostic was selected.
    DiagnosticSelected {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// Analysis finished without anything to navigate to.
    NoErrorsFound,
    /// Analysis is still running; the request will be retried once it finishes.
    AnalysisInProgress,
    /// The word under the caret was selected.
    WordSelected {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// There is no word at the caret.
    NoWord,
}
