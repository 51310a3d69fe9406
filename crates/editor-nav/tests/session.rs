use editor_nav::{
    DiagnosticStore, EditorView, HeadlessEditor, HeadlessSearchField, MatchRange, NavCommand,
    NavContext, NavEvent, NavResult, NavSettings, NavigationSession, RegexSearch, SearchOptions,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

#[test]
fn test_selection_becomes_term_and_refreshes_find_field() {
    let mut editor = HeadlessEditor::new("ab cd ab");
    editor.select(0, 2, 2);
    let mut field = HeadlessSearchField::new();
    field.text = "zz".to_string();
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings::default());

    let mut ctx =
        NavContext::new(&mut editor, &mut search, &diagnostics).with_search_field(&mut field);
    assert_eq!(
        session.next_match(&mut ctx).unwrap(),
        NavResult::MatchSelected { start: 6, end: 8 }
    );
    assert_eq!(session.last_search_term(), Some("ab"));
    assert_eq!(field.text, "ab");
    assert_eq!(field.cursor, Some((MatchRange::new(6, 8), 1, 2)));
}

#[test]
fn test_focused_field_overrides_selection() {
    let mut editor = HeadlessEditor::new("ab cd ab cd");
    editor.select(0, 2, 2);
    let mut field = HeadlessSearchField::new();
    field.text = "cd".to_string();
    field.focused = true;
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings::default());

    let mut ctx =
        NavContext::new(&mut editor, &mut search, &diagnostics).with_search_field(&mut field);
    assert_eq!(
        session.next_match(&mut ctx).unwrap(),
        NavResult::MatchSelected { start: 3, end: 5 }
    );
    assert_eq!(session.last_search_term(), Some("cd"));
}

#[test]
fn test_field_sync_failure_does_not_abort_navigation() {
    let mut editor = HeadlessEditor::new("one two one");
    editor.select(0, 3, 3);
    let mut field = HeadlessSearchField::new();
    field.fail_sync = true;
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings::default());

    let mut ctx =
        NavContext::new(&mut editor, &mut search, &diagnostics).with_search_field(&mut field);
    assert_eq!(
        session.next_match(&mut ctx).unwrap(),
        NavResult::MatchSelected { start: 8, end: 11 }
    );
    assert_eq!(ctx.editor.caret_offset(), 11);
    assert_eq!(field.cursor, None);
}

#[test]
fn test_settings_options_apply_without_find_field() {
    let mut editor = HeadlessEditor::new("Foo foo FOO");
    editor.select(0, 3, 3);
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings {
        search_options: SearchOptions {
            case_sensitive: false,
            ..SearchOptions::default()
        },
        ..NavSettings::default()
    });

    let mut ctx = NavContext::new(&mut editor, &mut search, &diagnostics);
    session.next_match(&mut ctx).unwrap();
    assert_eq!(session.tracker().cache().len(), 3);
}

#[test]
fn test_events_are_emitted_in_order() {
    let mut editor = HeadlessEditor::new("ab ab");
    editor.select(0, 2, 2);
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings::default());

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = session.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    let mut ctx = NavContext::new(&mut editor, &mut search, &diagnostics);
    session.next_match(&mut ctx).unwrap();
    session.next_match(&mut ctx).unwrap();
    drop(subscription);
    session.next_match(&mut ctx).unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            NavEvent::SearchTermChanged {
                term: "ab".to_string()
            },
            NavEvent::MatchSelected {
                range: MatchRange::new(3, 5),
                index: 1,
                total: 2
            },
            NavEvent::MatchSelected {
                range: MatchRange::new(0, 2),
                index: 0,
                total: 2
            },
        ]
    );
}

#[test]
fn test_sessions_are_independent() {
    let mut editor = HeadlessEditor::new("ab cd ab cd");
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut first = NavigationSession::new(NavSettings::default());
    let mut second = NavigationSession::new(NavSettings::default());

    editor.select(0, 2, 2);
    first
        .next_match(&mut NavContext::new(&mut editor, &mut search, &diagnostics))
        .unwrap();

    editor.move_caret(0);
    assert_eq!(
        second
            .next_match(&mut NavContext::new(&mut editor, &mut search, &diagnostics))
            .unwrap(),
        NavResult::NoSearchTerm
    );
    assert_eq!(first.last_search_term(), Some("ab"));
    assert_eq!(second.last_search_term(), None);
}

#[test]
fn test_select_word_at_caret() {
    let mut editor = HeadlessEditor::new("let value = other_value;");
    editor.move_caret(7);
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings::default());

    let mut ctx = NavContext::new(&mut editor, &mut search, &diagnostics);
    assert_eq!(
        session.execute(NavCommand::SelectWordAtCaret, &mut ctx).unwrap(),
        NavResult::WordSelected { start: 4, end: 9 }
    );
    assert_eq!(ctx.editor.caret_offset(), 7);
    assert_eq!(ctx.editor.selected_text().as_deref(), Some("value"));

    ctx.editor.move_caret(10);
    assert_eq!(
        session.execute(NavCommand::SelectWordAtCaret, &mut ctx).unwrap(),
        NavResult::NoWord
    );
}

#[test]
fn test_selected_word_feeds_next_match() {
    let mut editor = HeadlessEditor::new("let value = other_value + value;");
    editor.move_caret(5);
    let mut search = RegexSearch::new();
    let diagnostics = DiagnosticStore::new();
    let mut session = NavigationSession::new(NavSettings::default());

    let mut ctx = NavContext::new(&mut editor, &mut search, &diagnostics);
    session
        .execute(NavCommand::SelectWordAtCaret, &mut ctx)
        .unwrap();
    assert_eq!(
        session.execute(NavCommand::NextMatch, &mut ctx).unwrap(),
        NavResult::MatchSelected { start: 18, end: 23 }
    );
}
