//! "Go to next/previous error" ranking and navigation.
//!
//! Diagnostics are re-read on every call; nothing is cached between calls except a pending
//! retry while analysis is still running. The retry's completion listener unsubscribes itself
//! the first time it fires; the host then runs the retry through the session.
//!
//! Severity tiers are tried from the most severe tier down to tier 1 (tier 0 is reserved).
//! Within a tier every diagnostic at or above the tier's severity is offered to a four-slot
//! decision table, [`BestCandidates`]:
//!
//! | slot | probe offset | candidates |
//! |---|---|---|
//! | 1 | caret | navigation-eligible severities |
//! | 2 | document end (forward) / start (backward) | navigation-eligible severities |
//! | 3 | caret | all diagnostics |
//! | 4 | document end (forward) / start (backward) | all diagnostics |
//!
//! The first non-empty slot in that order wins, and the first tier with a winner ends the search.

use crate::diagnostics::{DiagnosticRange, DiagnosticsProvider, Severity};
use crate::document::NavDocument;
use crate::editor::{EditorView, NavMessage, ScrollType};
use crate::events::Subscription;
use crate::match_tracker::Direction;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// The offset within a diagnostic that the caret lands on.
///
/// One past the start, or `navigation_shift` past the start for after-end-of-line diagnostics
/// that do not sit on a newline; clamped to the document length.
pub fn navigation_position(diagnostic: &DiagnosticRange, document: &dyn NavDocument) -> usize {
    let len = document.len_chars();
    let start = diagnostic.start;
    if start >= len {
        return len;
    }

    let shift = match document.char_at(start) {
        Some(ch) if diagnostic.after_end_of_line && ch != '\n' => diagnostic.navigation_shift,
        _ => 1,
    };
    (start + shift).min(len)
}

/// Whether a candidate at `new` beats the current best at `old`, relative to `probe`.
///
/// Forward: prefer the first position strictly after the probe, then the smallest position.
/// Backward: prefer the last position strictly before the probe, then the largest position.
pub fn is_better_than(direction: Direction, old: Option<usize>, probe: usize, new: usize) -> bool {
    let Some(old) = old else {
        return true;
    };

    match direction {
        Direction::Forward => {
            if (probe < old) != (probe < new) {
                probe < new
            } else {
                new < old
            }
        }
        Direction::Backward => {
            if (probe <= old) != (probe <= new) {
                probe > new
            } else {
                new > old
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Caret,
    Wraparound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    NavigationEligible,
    Any,
}

const RESOLUTION_ORDER: [(Probe, Class); 4] = [
    (Probe::Caret, Class::NavigationEligible),
    (Probe::Wraparound, Class::NavigationEligible),
    (Probe::Caret, Class::Any),
    (Probe::Wraparound, Class::Any),
];

/// Running winners of one tier scan: two probes × two eligibility classes.
#[derive(Debug, Clone)]
pub struct BestCandidates {
    direction: Direction,
    caret: usize,
    wraparound: usize,
    slots: [Option<(usize, DiagnosticRange)>; 4],
}

impl BestCandidates {
    /// Empty table for a scan from `caret` in `direction` over a document of `len` chars.
    pub fn new(direction: Direction, caret: usize, len: usize) -> Self {
        let wraparound = match direction {
            Direction::Forward => len,
            Direction::Backward => 0,
        };
        Self {
            direction,
            caret,
            wraparound,
            slots: [None, None, None, None],
        }
    }

    fn slot(probe: Probe, class: Class) -> usize {
        match (probe, class) {
            (Probe::Caret, Class::NavigationEligible) => 0,
            (Probe::Wraparound, Class::NavigationEligible) => 1,
            (Probe::Caret, Class::Any) => 2,
            (Probe::Wraparound, Class::Any) => 3,
        }
    }

    fn probe_offset(&self, probe: Probe) -> usize {
        match probe {
            Probe::Caret => self.caret,
            Probe::Wraparound => self.wraparound,
        }
    }

    /// Offer a diagnostic whose navigation position is `position`.
    pub fn offer(&mut self, diagnostic: &DiagnosticRange, position: usize, eligible: bool) {
        for (probe, class) in RESOLUTION_ORDER {
            if class == Class::NavigationEligible && !eligible {
                continue;
            }
            let probe_offset = self.probe_offset(probe);
            let slot = &mut self.slots[Self::slot(probe, class)];
            let old = slot.as_ref().map(|(pos, _)| *pos);
            if is_better_than(self.direction, old, probe_offset, position) {
                *slot = Some((position, diagnostic.clone()));
            }
        }
    }

    /// The winner: the first filled slot in resolution order.
    pub fn resolve(self) -> Option<DiagnosticRange> {
        let Self { mut slots, .. } = self;
        RESOLUTION_ORDER
            .iter()
            .find_map(|&(probe, class)| slots[Self::slot(probe, class)].take())
            .map(|(_, diagnostic)| diagnostic)
    }
}

/// Result of a "go to next/previous error" command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorNavOutcome {
    /// The caret moved to this diagnostic.
    Navigated(DiagnosticRange),
    /// Analysis finished and there is nothing to navigate to.
    NoErrorsFound,
    /// Analysis is still running; a retry is pending.
    AnalysisInProgress,
}

/// Options for one error-navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorNavOptions {
    /// Start at the most severe tier instead of tier 1.
    pub go_errors_first: bool,
    /// Show the diagnostic detail popup after navigating.
    pub show_tooltip: bool,
}

struct PendingRetry {
    direction: Direction,
    caret: usize,
    analysis_done: Arc<AtomicBool>,
    listener: Arc<Mutex<Option<Subscription>>>,
}

impl Drop for PendingRetry {
    fn drop(&mut self) {
        release_listener(&self.listener);
    }
}

fn release_listener(slot: &Mutex<Option<Subscription>>) {
    // Take the guard before dropping it so the slot lock is not held while unsubscribing.
    let subscription = slot
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    drop(subscription);
}

/// Error navigation state: only the pending retry survives between calls.
#[derive(Default)]
pub struct ErrorNavigator {
    pending: Option<PendingRetry>,
}

impl ErrorNavigator {
    /// A navigator with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the diagnostic to navigate to from `caret`.
    pub fn find_next_diagnostic(
        &self,
        document: &dyn NavDocument,
        diagnostics: &dyn DiagnosticsProvider,
        caret: usize,
        direction: Direction,
        go_errors_first: bool,
    ) -> Option<DiagnosticRange> {
        let max_tier = if go_errors_first {
            diagnostics.severity_tier_count().saturating_sub(1)
        } else {
            1
        };

        for tier in (1..=max_tier).rev() {
            let Some(min_severity) = diagnostics.severity_at(tier) else {
                continue;
            };
            if let Some(found) =
                self.find_in_tier(document, diagnostics, caret, direction, &min_severity)
            {
                debug!(
                    tier,
                    severity = %min_severity.name,
                    start = found.start,
                    end = found.end,
                    "selected diagnostic"
                );
                return Some(found);
            }
        }
        None
    }

    fn find_in_tier(
        &self,
        document: &dyn NavDocument,
        diagnostics: &dyn DiagnosticsProvider,
        caret: usize,
        direction: Direction,
        min_severity: &Severity,
    ) -> Option<DiagnosticRange> {
        let len = document.len_chars();
        let mut best = BestCandidates::new(direction, caret, len);
        diagnostics.diagnostics_in_range(min_severity, 0, len, &mut |diagnostic| {
            let position = navigation_position(diagnostic, document);
            let eligible = diagnostics.is_navigation_eligible(&diagnostic.severity);
            best.offer(diagnostic, position, eligible);
            true
        });
        best.resolve()
    }

    /// Run "go to next/previous error" against `editor`.
    ///
    /// The search starts one past the selection start when something is selected, otherwise at
    /// the caret.
    pub fn goto_next_error(
        &mut self,
        editor: &mut dyn EditorView,
        diagnostics: &dyn DiagnosticsProvider,
        direction: Direction,
        options: ErrorNavOptions,
    ) -> ErrorNavOutcome {
        let caret = match editor.selection() {
            Some(selection) => selection.start + 1,
            None => editor.caret_offset(),
        };
        self.goto_from(editor, diagnostics, direction, caret, options)
    }

    fn goto_from(
        &mut self,
        editor: &mut dyn EditorView,
        diagnostics: &dyn DiagnosticsProvider,
        direction: Direction,
        caret: usize,
        options: ErrorNavOptions,
    ) -> ErrorNavOutcome {
        let found = self.find_next_diagnostic(
            editor.document(),
            diagnostics,
            caret,
            direction,
            options.go_errors_first,
        );

        if let Some(diagnostic) = found {
            self.pending = None;
            navigate_to_diagnostic(editor, &diagnostic, options.show_tooltip);
            return ErrorNavOutcome::Navigated(diagnostic);
        }

        if diagnostics.is_analysis_finished() {
            self.pending = None;
            editor.show_hint(NavMessage::NoErrorsFound);
            return ErrorNavOutcome::NoErrorsFound;
        }

        let analysis_done = Arc::new(AtomicBool::new(false));
        let listener: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let done = Arc::clone(&analysis_done);
        let slot = Arc::clone(&listener);
        let subscription = diagnostics.subscribe_analysis_finished(Box::new(move |_| {
            done.store(true, Ordering::Release);
            // One-shot: unsubscribe as soon as completion is seen.
            release_listener(&slot);
        }));
        *listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(subscription);
        // Replacing drops the previous request and its listener.
        self.pending = Some(PendingRetry {
            direction,
            caret,
            analysis_done,
            listener,
        });
        debug!(caret, ?direction, "analysis in progress; error navigation deferred");
        editor.show_hint(NavMessage::AnalysisInProgress);
        ErrorNavOutcome::AnalysisInProgress
    }

    /// Whether a deferred request is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the provider signalled completion since the deferred request was registered.
    pub fn pending_ready(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.analysis_done.load(Ordering::Acquire))
    }

    /// Re-run the deferred request once, from the caret it was issued at.
    ///
    /// Returns `None` when nothing was pending. The pending entry is consumed before the retry,
    /// so the retry itself may register a fresh one if analysis restarted.
    pub fn retry_pending(
        &mut self,
        editor: &mut dyn EditorView,
        diagnostics: &dyn DiagnosticsProvider,
        options: ErrorNavOptions,
    ) -> Option<ErrorNavOutcome> {
        let pending = self.pending.take()?;
        let (direction, caret) = (pending.direction, pending.caret);
        drop(pending);
        debug!(caret, ?direction, "retrying deferred error navigation");
        Some(self.goto_from(editor, diagnostics, direction, caret, options))
    }

    /// Drop the deferred request (for example because its hint was dismissed).
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }
}

/// Move the caret to `diagnostic`, select it, scroll it into view and unfold it.
pub fn navigate_to_diagnostic(
    editor: &mut dyn EditorView,
    diagnostic: &DiagnosticRange,
    show_tooltip: bool,
) {
    let old_offset = editor.caret_offset();
    let offset = navigation_position(diagnostic, editor.document());

    if offset != old_offset {
        let scroll = if offset > old_offset {
            ScrollType::CenterDown
        } else {
            ScrollType::CenterUp
        };
        editor.remove_selection();
        editor.remove_secondary_carets();
        editor.move_caret(offset);
        editor.set_selection(diagnostic.start, diagnostic.end);
        editor.scroll_to_caret(scroll);
        if editor.expand_collapsed_fold_at(offset) {
            debug!(offset, "expanded fold hiding diagnostic");
        }
    }

    let len = editor.document().len_chars();
    if len > 0 {
        let max_offset = len - 1;
        editor.scroll_to_offset(max_offset.min(diagnostic.end), ScrollType::MakeVisible);
        editor.scroll_to_offset(max_offset.min(offset), ScrollType::MakeVisible);
        if show_tooltip {
            editor.show_diagnostic_tooltip(diagnostic);
        }
    }
}
