mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_input_assigns_and_resumes() {
    let mut r = Runtime::default();
    r.enter("INPUT A:PRINTLN A*2");
    assert_eq!(exec(&mut r), "? ");
    r.enter("21");
    assert_eq!(exec(&mut r), "42\n");
}

#[test]
fn test_input_prompt_literal() {
    let mut r = Runtime::default();
    r.enter(r#"INPUT "NAME"; N$"#);
    assert_eq!(exec(&mut r), "NAME? ");
    r.enter("BADGE");
    assert_eq!(exec(&mut r), "");
    r.enter("PRINTLN N$");
    assert_eq!(exec(&mut r), "BADGE\n");
}

#[test]
fn test_input_multiple_values() {
    let mut r = Runtime::default();
    r.enter(r#"INPUT A, B$:PRINTLN A;" ";B$"#);
    assert_eq!(exec(&mut r), "? ");
    r.enter(r#"7, SEVEN"#);
    assert_eq!(exec(&mut r), "7 SEVEN\n");
}

#[test]
fn test_input_quoted_text_keeps_commas() {
    let mut r = Runtime::default();
    r.enter("INPUT T$:PRINTLN T$");
    assert_eq!(exec(&mut r), "? ");
    r.enter(r#""A, B""#);
    assert_eq!(exec(&mut r), "A, B\n");
}

#[test]
fn test_bad_numeric_reply_asks_again() {
    let mut r = Runtime::default();
    r.enter("INPUT A:PRINTLN A");
    assert_eq!(exec(&mut r), "? ");
    r.enter("not a number");
    assert_eq!(exec(&mut r), "?REDO FROM START\n? ");
    r.enter("5");
    assert_eq!(exec(&mut r), "5\n");
}

#[test]
fn test_extra_values_are_ignored() {
    let mut r = Runtime::default();
    r.enter("INPUT A:PRINTLN A");
    assert_eq!(exec(&mut r), "? ");
    r.enter("1, 2");
    assert_eq!(exec(&mut r), "?EXTRA IGNORED\n1\n");
}
