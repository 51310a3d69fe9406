use editor_nav::{
    DiagnosticStore, EditorView, HeadlessEditor, HeadlessSearchField, MatchRange, MatchTracker,
    NavCommand, NavContext, NavError, NavResult, NavSettings, NavigationSession, RegexSearch,
    SearchFingerprint, SearchOptions, TextDocument, closest_match_index,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Host {
    editor: HeadlessEditor,
    search: RegexSearch,
    diagnostics: DiagnosticStore,
    field: HeadlessSearchField,
    session: NavigationSession,
}

impl Host {
    fn new(text: &str) -> Self {
        Self {
            editor: HeadlessEditor::new(text),
            search: RegexSearch::new(),
            diagnostics: DiagnosticStore::new(),
            field: HeadlessSearchField::new(),
            session: NavigationSession::new(NavSettings::default()),
        }
    }

    fn with_field_text(text: &str, term: &str) -> Self {
        let mut host = Self::new(text);
        host.field.text = term.to_string();
        host
    }

    fn try_run(&mut self, command: NavCommand) -> Result<NavResult, NavError> {
        let mut ctx = NavContext::new(&mut self.editor, &mut self.search, &self.diagnostics)
            .with_search_field(&mut self.field);
        self.session.execute(command, &mut ctx)
    }

    fn run(&mut self, command: NavCommand) -> NavResult {
        self.try_run(command).unwrap()
    }

    fn rebuilds(&self) -> u64 {
        self.session.tracker().cache().rebuild_count()
    }
}

fn selected(start: usize, end: usize) -> NavResult {
    NavResult::MatchSelected { start, end }
}

#[test]
fn test_forward_steps_through_matches_and_wraps() {
    let mut host = Host::with_field_text("ababab", "ab");

    assert_eq!(host.run(NavCommand::NextMatch), selected(0, 2));
    assert_eq!(host.editor.caret_offset(), 2);
    assert_eq!(host.run(NavCommand::NextMatch), selected(2, 4));
    assert_eq!(host.run(NavCommand::NextMatch), selected(4, 6));
    assert_eq!(host.run(NavCommand::NextMatch), selected(0, 2));

    assert_eq!(host.editor.selection(), Some(MatchRange::new(0, 2)));
    assert_eq!(host.field.cursor, Some((MatchRange::new(0, 2), 0, 3)));
    assert_eq!(host.rebuilds(), 1);
}

#[test]
fn test_backward_wraps_from_first_match_to_last() {
    let mut host = Host::with_field_text("ababab", "ab");

    assert_eq!(host.run(NavCommand::PreviousMatch), selected(0, 2));
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(4, 6));
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(2, 4));
}

#[test]
fn test_previous_undoes_next() {
    let mut host = Host::with_field_text("x ab y ab z ab", "ab");

    assert_eq!(host.run(NavCommand::NextMatch), selected(2, 4));
    assert_eq!(host.run(NavCommand::NextMatch), selected(7, 9));
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(2, 4));
    assert_eq!(host.run(NavCommand::NextMatch), selected(7, 9));
}

#[test]
fn test_moved_caret_jumps_to_match_after_it() {
    let mut host = Host::with_field_text("ababab", "ab");
    host.run(NavCommand::NextMatch);

    host.editor.move_caret(3);
    assert_eq!(host.run(NavCommand::NextMatch), selected(4, 6));
    assert_eq!(host.editor.caret_offset(), 6);
}

#[test]
fn test_moved_caret_past_last_match_wraps_to_first() {
    let mut host = Host::with_field_text("ab xx ab xx", "ab");
    host.run(NavCommand::NextMatch);

    host.editor.move_caret(9);
    assert_eq!(host.run(NavCommand::NextMatch), selected(0, 2));
}

#[test]
fn test_previous_after_moving_caret_lands_on_match_before_it() {
    let mut host = Host::with_field_text("ab xx ab xx", "ab");
    host.run(NavCommand::NextMatch);

    host.editor.move_caret(10);
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(6, 8));

    host.editor.move_caret(4);
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(0, 2));
}

#[test]
fn test_previous_before_first_match_wraps_to_last() {
    let mut host = Host::with_field_text("xx ab xx ab", "ab");
    host.run(NavCommand::NextMatch);

    host.editor.move_caret(1);
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(9, 11));
}

#[test]
fn test_previous_jump_then_next_steps_forward() {
    let mut host = Host::with_field_text("ab xx ab xx ab", "ab");
    host.run(NavCommand::NextMatch);

    host.editor.move_caret(10);
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(6, 8));
    assert_eq!(host.run(NavCommand::NextMatch), selected(12, 14));
}

#[test]
fn test_caret_on_match_start_toggles_endpoint_instead_of_moving() {
    let mut host = Host::with_field_text("ababab", "ab");
    host.run(NavCommand::NextMatch);
    assert_eq!(host.run(NavCommand::NextMatch), selected(2, 4));
    assert_eq!(host.editor.caret_offset(), 4);

    // Caret back on the start of the landed match, nothing selected: the term is reused and
    // the caret flips to the match end without advancing.
    host.editor.move_caret(2);
    assert_eq!(host.run(NavCommand::NextMatch), selected(2, 4));
    assert_eq!(host.editor.caret_offset(), 4);

    host.editor.move_caret(4);
    assert_eq!(host.run(NavCommand::PreviousMatch), selected(2, 4));
    assert_eq!(host.editor.caret_offset(), 2);
}

#[test]
fn test_edit_marks_cache_dirty() {
    let mut host = Host::with_field_text("ab ab", "ab");
    host.run(NavCommand::NextMatch);
    host.run(NavCommand::NextMatch);
    assert_eq!(host.rebuilds(), 1);

    host.editor.document_mut().insert(5, " ab").unwrap();
    host.run(NavCommand::NextMatch);
    assert_eq!(host.rebuilds(), 2);
    assert_eq!(host.session.tracker().cache().len(), 3);
}

#[test]
fn test_rebuilding_unchanged_document_yields_same_matches() {
    let document = TextDocument::new("ababab");
    let fingerprint = SearchFingerprint::new("ab", SearchOptions::default());
    let mut search = RegexSearch::new();
    let mut tracker = MatchTracker::new();

    assert!(tracker.refresh(&document, &fingerprint, &mut search).unwrap());
    let first = tracker.cache().matches().to_vec();
    assert!(!tracker.refresh(&document, &fingerprint, &mut search).unwrap());

    tracker.mark_dirty();
    assert!(tracker.refresh(&document, &fingerprint, &mut search).unwrap());
    assert_eq!(tracker.cache().matches(), first.as_slice());
    assert_eq!(
        first,
        vec![
            MatchRange::new(0, 2),
            MatchRange::new(2, 4),
            MatchRange::new(4, 6)
        ]
    );
    assert_eq!(tracker.cache().rebuild_count(), 2);
}

#[test]
fn test_option_change_rebuilds_without_edit() {
    let mut host = Host::with_field_text("ab AB ab", "ab");
    host.run(NavCommand::NextMatch);
    assert_eq!(host.session.tracker().cache().len(), 2);

    host.field.options.case_sensitive = false;
    host.run(NavCommand::NextMatch);
    assert_eq!(host.rebuilds(), 2);
    assert_eq!(host.session.tracker().cache().len(), 3);
}

#[test]
fn test_no_matches_reports_not_found_and_leaves_caret() {
    let mut host = Host::with_field_text("ababab", "zz");
    host.editor.move_caret(3);

    assert_eq!(host.run(NavCommand::NextMatch), NavResult::NotFound);
    assert_eq!(host.editor.caret_offset(), 3);
    assert_eq!(host.field.cursor, None);
}

#[test]
fn test_no_term_at_all() {
    let mut host = Host::new("ababab");
    assert_eq!(host.run(NavCommand::NextMatch), NavResult::NoSearchTerm);
    assert_eq!(host.rebuilds(), 0);
}

#[test]
fn test_document_swap_rebuilds_and_forgets_old_document() {
    let mut host = Host::with_field_text("ab ab", "ab");
    host.run(NavCommand::NextMatch);

    let mut old = host.editor.replace_document(TextDocument::new("xx ab"));
    assert_eq!(host.run(NavCommand::NextMatch), selected(3, 5));
    assert_eq!(host.rebuilds(), 2);

    // Edits to the previous document no longer dirty the cache.
    old.insert(0, "ab ").unwrap();
    host.run(NavCommand::NextMatch);
    assert_eq!(host.rebuilds(), 2);
}

#[test]
fn test_invalid_regex_is_an_error() {
    let mut host = Host::with_field_text("a(b", "(");
    host.field.options.regex = true;

    assert!(matches!(
        host.try_run(NavCommand::NextMatch),
        Err(NavError::InvalidRegex(_))
    ));

    host.field.options.regex = false;
    assert_eq!(host.run(NavCommand::NextMatch), selected(1, 2));
}

#[test]
fn test_whole_word_and_unicode_offsets() {
    let mut host = Host::with_field_text("👋 foo foobar foo", "foo");
    host.field.options.whole_word = true;

    assert_eq!(host.run(NavCommand::NextMatch), selected(2, 5));
    assert_eq!(host.run(NavCommand::NextMatch), selected(13, 16));
}

#[test]
fn test_closest_match_index_is_insertion_point() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let count = rng.gen_range(0..40);
        let mut start = 0;
        let mut matches = Vec::with_capacity(count);
        for _ in 0..count {
            start += rng.gen_range(1..6);
            let len = rng.gen_range(1..4);
            matches.push(MatchRange::new(start, start + len));
            start += len;
        }

        let probe = rng.gen_range(0..start + 5);
        let index = closest_match_index(&matches, probe);
        assert!(index <= matches.len());
        assert_eq!(index, matches.partition_point(|m| m.start < probe));
    }
}
