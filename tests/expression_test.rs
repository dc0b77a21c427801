mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_precedence() {
    let mut r = Runtime::default();
    r.enter("PRINTLN 2+3*4");
    assert_eq!(exec(&mut r), "14\n");
    r.enter("PRINTLN (2+3)*4");
    assert_eq!(exec(&mut r), "20\n");
}

#[test]
fn test_left_assoc() {
    let mut r = Runtime::default();
    r.enter("PRINTLN 10-2-3");
    assert_eq!(exec(&mut r), "5\n");
    r.enter("PRINTLN 1.5/2*3");
    assert_eq!(exec(&mut r), "2.25\n");
}

#[test]
fn test_boolean_cascade() {
    let mut r = Runtime::default();
    r.enter("PRINTLN 1<2 AND 3>2");
    assert_eq!(exec(&mut r), "1\n");
    r.enter("PRINTLN 1>2 OR 2>1");
    assert_eq!(exec(&mut r), "1\n");
    r.enter("PRINTLN NOT 1=1");
    assert_eq!(exec(&mut r), "0\n");
}

#[test]
fn test_division_by_zero_is_fatal() {
    let mut r = Runtime::default();
    r.enter("PRINTLN 1/0");
    assert_eq!(exec(&mut r), "?DIVISION BY ZERO\n");
    // the interpreter itself survives
    r.enter("PRINTLN 6/2");
    assert_eq!(exec(&mut r), "3\n");
}

#[test]
fn test_text_comparison_and_concat() {
    let mut r = Runtime::default();
    r.enter(r#"A$="AB":PRINTLN A$+"C""#);
    assert_eq!(exec(&mut r), "ABC\n");
    r.enter(r#"PRINTLN "APPLE" < "BANANA""#);
    assert_eq!(exec(&mut r), "1\n");
    r.enter(r#"PRINTLN "A" <> "A""#);
    assert_eq!(exec(&mut r), "0\n");
}

#[test]
fn test_mixed_kinds_are_type_errors() {
    let mut r = Runtime::default();
    r.enter(r#"PRINTLN "A" = 1"#);
    assert_eq!(exec(&mut r), "?TYPE MISMATCH\n");
    r.enter(r#"PRINTLN 1 + "A""#);
    assert_eq!(exec(&mut r), "?TYPE MISMATCH\n");
}

#[test]
fn test_functions() {
    let mut r = Runtime::default();
    r.enter("PRINTLN ABS(-4) + MAX(1, 2)");
    assert_eq!(exec(&mut r), "6\n");
    r.enter("PRINTLN INT(2.9)");
    assert_eq!(exec(&mut r), "2\n");
    r.enter("PRINTLN NOPE(1)");
    assert_eq!(exec(&mut r), "?UNDEFINED FUNCTION\n");
    r.enter("PRINTLN SQR(-1)");
    assert_eq!(exec(&mut r), "?ILLEGAL FUNCTION CALL\n");
}

#[test]
fn test_print_shorthand_and_zones() {
    let mut r = Runtime::default();
    r.enter("? 7");
    assert_eq!(exec(&mut r), "7");
    let mut r = Runtime::default();
    r.enter("PRINTLN 1,2");
    assert_eq!(exec(&mut r), "1             2\n");
    r.enter(r#"PRINTLN "A";"B""#);
    assert_eq!(exec(&mut r), "AB\n");
}

#[test]
fn test_deep_nesting_is_bounded() {
    let mut r = Runtime::default();
    let mut line = String::from("PRINTLN ");
    for _ in 0..100 {
        line.push('(');
    }
    line.push('1');
    for _ in 0..100 {
        line.push(')');
    }
    r.enter(&line);
    assert_eq!(exec(&mut r), "?FORMULA TOO COMPLEX\n");
}
