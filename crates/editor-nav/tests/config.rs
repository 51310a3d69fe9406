use editor_nav::{NavError, NavSettings, SearchOptions};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_defaults() {
    let settings = NavSettings::default();
    assert!(settings.go_errors_first);
    assert!(settings.show_error_tooltip);
    assert_eq!(
        settings.search_options,
        SearchOptions {
            case_sensitive: true,
            whole_word: false,
            regex: false
        }
    );
}

#[test]
fn test_partial_json_keeps_defaults() {
    let settings =
        NavSettings::from_json_str(r#"{ "search_options": { "whole_word": true } }"#).unwrap();
    assert!(settings.go_errors_first);
    assert!(settings.search_options.whole_word);
    assert!(settings.search_options.case_sensitive);
}

#[test]
fn test_unknown_fields_are_rejected() {
    let result = NavSettings::from_json_str(r#"{ "go_errors_frist": false }"#);
    assert!(matches!(result, Err(NavError::Settings(_))));
}

#[test]
fn test_load_from_file_and_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "go_errors_first": false, "show_error_tooltip": false }}"#
    )
    .unwrap();

    let settings = NavSettings::load(file.path()).unwrap();
    assert!(!settings.go_errors_first);
    assert!(!settings.show_error_tooltip);

    let json = settings.to_json_string().unwrap();
    assert_eq!(NavSettings::from_json_str(&json).unwrap(), settings);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = NavSettings::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(NavError::Io(_))));
}
