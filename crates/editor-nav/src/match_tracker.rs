//! Match cache and cursor tracker.
//!
//! # Overview
//!
//! Quick-find keeps the full, ordered list of matches of the active search term and an index
//! into it. Repeated "find next"/"find previous" presses step through that list with
//! wraparound; moving the caret away from the last landed match makes the next press jump to
//! the match nearest the caret instead.
//!
//! The list is rebuilt wholesale (never patched) when:
//! - the document changed since the last rebuild (the [`DirtyFlag`] is set), or
//! - the [`SearchFingerprint`] differs from the one the list was built for.
//!
//! # Example
//!
//! ```rust
//! use editor_nav::{
//!     AdvanceRequest, Direction, MatchRange, MatchTracker, RegexSearch, SearchFingerprint,
//!     SearchOptions, TextDocument,
//! };
//!
//! let doc = TextDocument::new("ababab");
//! let fingerprint = SearchFingerprint::new("ab", SearchOptions::default());
//! let mut tracker = MatchTracker::new();
//! let mut search = RegexSearch::new();
//!
//! let landing = tracker
//!     .advance(
//!         &doc,
//!         AdvanceRequest::new(0, 0, 0, &fingerprint, Direction::Forward),
//!         &mut search,
//!     )
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(landing.range, MatchRange::new(0, 2));
//! assert_eq!(landing.caret_offset(), 2);
//! ```

use crate::NavError;
use crate::document::NavDocument;
use crate::search::{MatchRange, SearchFingerprint, SearchPrimitive};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the end of the document.
    Forward,
    /// Towards the start of the document.
    Backward,
}

impl Direction {
    /// `true` for [`Direction::Forward`].
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }
}

/// Shared "document changed since the last rebuild" flag.
///
/// Clones share the flag, so a document-change listener can hold one and mark it.
#[derive(Debug, Clone)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    /// A flag that starts set, so the first use rebuilds.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Set the flag.
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the flag is set.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered, non-overlapping matches of one fingerprint over one document text.
#[derive(Debug, Clone, Default)]
pub struct MatchCache {
    matches: Vec<MatchRange>,
    fingerprint: Option<SearchFingerprint>,
    rebuild_count: u64,
}

impl MatchCache {
    /// An empty cache that has never been built.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with every match of `fingerprint` in `text`.
    ///
    /// Scans from offset 0, restarting each step at the previous match's end, until the
    /// primitive reports a terminal result. On error the cache is left empty and unbuilt.
    pub fn rebuild<S>(
        &mut self,
        text: &str,
        fingerprint: &SearchFingerprint,
        search: &mut S,
    ) -> Result<(), NavError>
    where
        S: SearchPrimitive + ?Sized,
    {
        self.matches.clear();
        self.fingerprint = None;
        self.rebuild_count += 1;

        search.begin_scan(text);
        let scanned = scan_all(text, fingerprint, search, &mut self.matches);
        search.end_scan();

        if let Err(err) = scanned {
            self.matches.clear();
            return Err(err);
        }

        self.fingerprint = Some(fingerprint.clone());
        Ok(())
    }

    /// Whether a cache built for the current fingerprint cannot serve `fingerprint`.
    pub fn needs_rebuild(&self, fingerprint: &SearchFingerprint) -> bool {
        match &self.fingerprint {
            Some(built_for) => fingerprint.differs_from(built_for),
            None => true,
        }
    }

    /// Cached matches, sorted by start offset.
    pub fn matches(&self) -> &[MatchRange] {
        &self.matches
    }

    /// Number of cached matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns `true` when there are no cached matches.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The fingerprint the cache was built for.
    pub fn fingerprint(&self) -> Option<&SearchFingerprint> {
        self.fingerprint.as_ref()
    }

    /// How many times the cache has been rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }
}

fn scan_all<S>(
    text: &str,
    fingerprint: &SearchFingerprint,
    search: &mut S,
    out: &mut Vec<MatchRange>,
) -> Result<(), NavError>
where
    S: SearchPrimitive + ?Sized,
{
    let mut from = 0;
    loop {
        let found = search.search(text, from, fingerprint)?;
        if found.is_terminal() {
            return Ok(());
        }
        if found.end <= from || found.start < from {
            warn!(
                from,
                start = found.start,
                end = found.end,
                "search primitive did not advance; stopping scan"
            );
            return Ok(());
        }
        out.push(found);
        from = found.end;
    }
}

/// Index of the cached match whose start is "closest" to `probe`.
///
/// Plain binary search over start offsets. Without an exact hit it returns the midpoint of the
/// final empty interval, which is the first match starting after `probe` (or `matches.len()`
/// when none does). This is a nearby index, not necessarily the numerically nearest one.
pub fn closest_match_index(matches: &[MatchRange], probe: usize) -> usize {
    let (mut lo, mut hi) = (0, matches.len());
    while lo < hi {
        let mid = (lo + hi) / 2;
        match probe.cmp(&matches[mid].start) {
            std::cmp::Ordering::Less => hi = mid,
            std::cmp::Ordering::Greater => lo = mid + 1,
            std::cmp::Ordering::Equal => return mid,
        }
    }
    (lo + hi) / 2
}

/// Index to land on when the caret left the last match.
///
/// Forward takes the closest index, wrapping past the end to the first match. Backward keeps an
/// exact hit on `probe` and otherwise steps back one, wrapping before the start to the last match.
fn jump_index(matches: &[MatchRange], probe: usize, direction: Direction) -> usize {
    let size = matches.len();
    let index = closest_match_index(matches, probe);
    match direction {
        Direction::Forward if index >= size => 0,
        Direction::Forward => index,
        Direction::Backward if index < size && matches[index].start == probe => index,
        Direction::Backward if index == 0 => size - 1,
        Direction::Backward => index - 1,
    }
}

/// Where the cursor currently is within the match cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    /// Index into the cache, `None` before the first landing after a rebuild.
    pub index: Option<usize>,
    /// The match landed on last, [`MatchRange::NONE`] when there is none.
    pub last_result: MatchRange,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            index: None,
            last_result: MatchRange::NONE,
        }
    }
}

/// Inputs of one navigation step.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceRequest<'a> {
    /// Caret offset.
    pub caret: usize,
    /// Selection start (equal to `selection_end` when nothing is selected).
    pub selection_start: usize,
    /// Selection end.
    pub selection_end: usize,
    /// Active search configuration.
    pub fingerprint: &'a SearchFingerprint,
    /// Whether the term came from the current selection or find field, as opposed to being
    /// reused from an earlier search.
    pub has_search_string: bool,
    /// Direction of travel.
    pub direction: Direction,
}

impl<'a> AdvanceRequest<'a> {
    /// A request with an explicit search string.
    pub fn new(
        caret: usize,
        selection_start: usize,
        selection_end: usize,
        fingerprint: &'a SearchFingerprint,
        direction: Direction,
    ) -> Self {
        Self {
            caret,
            selection_start,
            selection_end,
            fingerprint,
            has_search_string: true,
            direction,
        }
    }

    /// Mark the term as reused from an earlier search.
    pub fn reusing_last_term(mut self) -> Self {
        self.has_search_string = false;
        self
    }

    fn probe(&self) -> usize {
        if !self.has_search_string {
            self.caret
        } else if self.direction.is_forward() {
            self.selection_end
        } else {
            self.selection_start
        }
    }
}

/// Result of a successful navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLanding {
    /// The match to select.
    pub range: MatchRange,
    /// Index of the match in the cache.
    pub index: usize,
    /// Number of cached matches.
    pub total: usize,
    /// Put the caret on the end of the match (otherwise on its start).
    pub caret_at_end: bool,
}

impl MatchLanding {
    /// Caret offset after landing.
    pub fn caret_offset(&self) -> usize {
        if self.caret_at_end {
            self.range.end
        } else {
            self.range.start
        }
    }
}

/// Match cache plus cursor: the quick-find state machine.
#[derive(Debug, Default)]
pub struct MatchTracker {
    cache: MatchCache,
    cursor: CursorState,
    dirty: DirtyFlag,
}

impl MatchTracker {
    /// A tracker whose first use rebuilds the cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the dirty flag, for document-change listeners.
    pub fn dirty_flag(&self) -> DirtyFlag {
        self.dirty.clone()
    }

    /// Force a rebuild on the next step.
    pub fn mark_dirty(&self) {
        self.dirty.mark();
    }

    /// The cache.
    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// The cursor.
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Rebuild the cache if the document is dirty or `fingerprint` differs from the cached one.
    /// Returns `true` if a rebuild happened.
    pub fn refresh<S>(
        &mut self,
        document: &dyn NavDocument,
        fingerprint: &SearchFingerprint,
        search: &mut S,
    ) -> Result<bool, NavError>
    where
        S: SearchPrimitive + ?Sized,
    {
        let dirty = self.dirty.is_set();
        if !dirty && !self.cache.needs_rebuild(fingerprint) {
            return Ok(false);
        }

        self.dirty.clear();
        let text = document.text();
        if let Err(err) = self.cache.rebuild(&text, fingerprint, search) {
            self.dirty.mark();
            return Err(err);
        }
        self.cursor = CursorState::default();
        debug!(
            term = %fingerprint.term,
            dirty,
            matches = self.cache.len(),
            "rebuilt match cache"
        );
        Ok(true)
    }

    /// Compute the next match to land on, rebuilding the cache first when needed.
    ///
    /// Returns `Ok(None)` when the document has no match.
    pub fn advance<S>(
        &mut self,
        document: &dyn NavDocument,
        request: AdvanceRequest<'_>,
        search: &mut S,
    ) -> Result<Option<MatchLanding>, NavError>
    where
        S: SearchPrimitive + ?Sized,
    {
        self.refresh(document, request.fingerprint, search)?;

        let size = self.cache.len();
        if size == 0 {
            return Ok(None);
        }

        let caret = request.caret;
        let forward = request.direction.is_forward();
        let last = self.cursor.last_result;
        let mut caret_at_end = caret == request.selection_end;

        let index = match self.cursor.index {
            Some(current) if last.touches(caret) => {
                if forward {
                    if !request.has_search_string && caret == last.start {
                        caret_at_end = true;
                        current
                    } else if current + 1 == size {
                        0
                    } else {
                        current + 1
                    }
                } else if !request.has_search_string && caret == last.end {
                    caret_at_end = false;
                    current
                } else if current == 0 {
                    size - 1
                } else {
                    current - 1
                }
            }
            _ => {
                let probe = request.probe();
                let index = jump_index(self.cache.matches(), probe, request.direction);
                debug!(caret, probe, index, "caret moved; jumping to closest match");
                index
            }
        };

        let range = self.cache.matches()[index];
        self.cursor = CursorState {
            index: Some(index),
            last_result: range,
        };

        Ok(Some(MatchLanding {
            range,
            index,
            total: size,
            caret_at_end,
        }))
    }
}
