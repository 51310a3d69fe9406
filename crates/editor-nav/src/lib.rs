#![warn(missing_docs)]
//! Editor Nav - Headless Find-Next and Next-Error Navigation
//!
//! # Overview
//!
//! `editor-nav` implements the navigation policy behind two editor commands, independent of
//! any UI toolkit:
//!
//! - **Quick find** ("find next/previous occurrence"): a cached, ordered list of matches of the
//!   active term plus a cursor into it. Repeated presses step with wraparound; moving the caret
//!   away jumps to the match closest to the caret. The list is rebuilt only when the document
//!   changed or the search configuration changed.
//! - **Next error** ("go to next/previous diagnostic"): severity tiers are scanned from most
//!   severe down, and within a tier a four-slot decision table picks the nearest diagnostic
//!   after the caret, wrapping around, preferring navigation-eligible severities.
//!
//! The host plugs in through traits: [`NavDocument`] (text and edit notifications),
//! [`EditorView`] (caret, selection, scrolling, folding, hints), [`SearchField`] (find bar),
//! [`SearchPrimitive`] (single-step search) and [`DiagnosticsProvider`] (highlights and
//! severities). In-memory implementations ([`TextDocument`], [`HeadlessEditor`],
//! [`HeadlessSearchField`], [`RegexSearch`], [`DiagnosticStore`]) cover tests and simple hosts.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  NavigationSession + NavCommand             │  ← Public API
//! ├──────────────────────┬──────────────────────┤
//! │  MatchTracker        │  ErrorNavigator      │  ← Navigation policy
//! ├──────────────────────┼──────────────────────┤
//! │  SearchPrimitive     │  DiagnosticsProvider │  ← Host seams
//! ├──────────────────────┴──────────────────────┤
//! │  NavDocument / EditorView / SearchField     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_nav::{
//!     DiagnosticRange, DiagnosticStore, EditorView, HeadlessEditor, NavContext, NavResult,
//!     NavigationSession, NavSettings, RegexSearch, Severity,
//! };
//!
//! let mut editor = HeadlessEditor::new("let x = 1;\nlet y = x;\n");
//! let mut search = RegexSearch::new();
//! let mut diagnostics = DiagnosticStore::new();
//! diagnostics.push(DiagnosticRange::new(15, 16, Severity::ERROR));
//! diagnostics.finish_analysis();
//!
//! let mut session = NavigationSession::new(NavSettings::default());
//! let mut ctx = NavContext::new(&mut editor, &mut search, &diagnostics);
//!
//! assert_eq!(
//!     session.next_diagnostic(&mut ctx),
//!     NavResult::DiagnosticSelected { start: 15, end: 16 }
//! );
//! assert_eq!(ctx.editor.caret_offset(), 16);
//! ```
//!
//! # Module Description
//!
//! - [`match_tracker`] - match cache, closest-match lookup, cursor state machine
//! - [`error_nav`] - severity-tiered diagnostic ranking and caret placement
//! - [`session`] - per-editor wiring of both, search-term resolution
//! - [`commands`] - command and result enums
//! - [`search`] - match ranges, fingerprints, the regex search primitive
//! - [`diagnostics`] - severities, tiers, diagnostic ranges, provider trait
//! - [`document`] / [`editor`] - host seams and headless implementations
//! - [`events`] - listener registry with drop-to-unsubscribe guards
//! - [`config`] - serde-backed settings

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod editor;
mod error;
pub mod error_nav;
pub mod events;
pub mod match_tracker;
pub mod search;
pub mod session;
pub mod word;

pub use commands::{NavCommand, NavResult};
pub use config::NavSettings;
pub use diagnostics::{
    DiagnosticRange, DiagnosticStore, DiagnosticsProvider, Severity, SeverityRegistry,
    default_navigation_eligibility,
};
pub use document::{DocumentId, NavDocument, TextDocument};
pub use editor::{
    EditorView, FoldRegion, HeadlessEditor, HeadlessSearchField, NavMessage, ScrollRequest,
    ScrollType, SearchField,
};
pub use error::NavError;
pub use error_nav::{
    BestCandidates, ErrorNavOptions, ErrorNavOutcome, ErrorNavigator, is_better_than,
    navigate_to_diagnostic, navigation_position,
};
pub use events::{AnalysisFinished, DocumentChange, ListenerSet, NavEvent, Subscription};
pub use match_tracker::{
    AdvanceRequest, CursorState, Direction, DirtyFlag, MatchCache, MatchLanding, MatchTracker,
    closest_match_index,
};
pub use search::{
    MatchRange, RegexSearch, SearchFingerprint, SearchOptions, SearchPrimitive, terms_differ,
};
pub use session::{NavContext, NavigationSession, TermResolution, resolve_search_term};
pub use word::word_range_at;
