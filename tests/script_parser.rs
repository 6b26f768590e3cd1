//! Tests for the plot script reader

use plot_director::script::{self, CommandKind, ScriptError};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_example_script_sections() {
    let script = script::parse_str(
        "a 1\n::END_OPTIONS::\n\n::END_DEFINITIONS::\nmoveto 0 0\n#note\npause extra\nlineto 1 1\n",
    );
    assert_eq!(script.options, vec!["a 1"]);
    assert!(script.definitions.is_empty());
    assert_eq!(
        script.remaining().collect::<Vec<_>>(),
        vec!["moveto 0 0", "#note", "pause extra", "lineto 1 1"]
    );
    assert_eq!(script.command_count(), 3);
}

#[test]
fn test_section_sizes_and_order() {
    let mut text = String::new();
    for i in 0..4 {
        text.push_str(&format!("  option {}  \n\n", i));
    }
    text.push_str("::END_OPTIONS::\n");
    for i in 0..2 {
        text.push_str(&format!("def {}\n", i));
    }
    text.push_str("   \n::END_DEFINITIONS::\n");
    for i in 0..7 {
        text.push_str(&format!("cmd {}\n", i));
        if i % 3 == 0 {
            text.push_str("# comment\n");
        }
    }

    let script = script::parse_str(&text);
    assert_eq!(script.options, vec!["option 0", "option 1", "option 2", "option 3"]);
    assert_eq!(script.definitions, vec!["def 0", "def 1"]);
    assert_eq!(script.remaining_len(), 10);
    assert_eq!(script.command_count(), 7);
    assert!(script.remaining().all(|line| !line.is_empty() && !line.starts_with("::END_")));
}

#[test]
fn test_unknown_marker_is_dropped() {
    let script = script::parse_str("opt\n::END_SOMETHING::\n::END_OPTIONS::\n::END_DEFINITIONS::\ngo\n");
    assert_eq!(script.options, vec!["opt"]);
    assert_eq!(script.remaining().collect::<Vec<_>>(), vec!["go"]);
}

#[test]
fn test_missing_markers_leave_everything_in_options() {
    let script = script::parse_str("moveto 1 1\nlineto 2 2\n");
    assert_eq!(script.options.len(), 2);
    assert!(!script.has_commands());
    assert_eq!(script.command_count(), 0);
}

#[test]
fn test_pause_needs_exact_first_token() {
    assert_eq!(CommandKind::classify("pause extra"), CommandKind::Pause);
    assert_eq!(CommandKind::classify("pauses"), CommandKind::Device);
    assert_eq!(CommandKind::classify("#pause"), CommandKind::Comment);
}

#[tokio::test]
async fn test_parse_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "speed 5\n::END_OPTIONS::\nsquare 10\n::END_DEFINITIONS::\nmoveto 0 0\n").unwrap();

    let mut script = script::parse(file.path()).await.unwrap();
    assert_eq!(script.options, vec!["speed 5"]);
    assert_eq!(script.definitions, vec!["square 10"]);
    assert_eq!(script.next_command().as_deref(), Some("moveto 0 0"));
    assert_eq!(script.next_command(), None);
}

#[tokio::test]
async fn test_parse_missing_file() {
    let result = script::parse("/no/such/plot.txt").await;
    match result {
        Err(ScriptError::Io { path, .. }) => assert_eq!(path, "/no/such/plot.txt"),
        Ok(_) => panic!("expected an I/O error"),
    }
}
