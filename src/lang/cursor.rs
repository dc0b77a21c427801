use super::{LineNumber, MaxValue};
use std::rc::Rc;

/// Words with grammatical meaning; never valid variable names.
const RESERVED: &[&str] = &[
    "LET", "PRINT", "PRINTLN", "IF", "THEN", "ELSE", "GOTO", "GOSUB", "RETURN", "END", "DO",
    "LOOP", "UNTIL", "WHILE", "FOR", "TO", "STEP", "NEXT", "AND", "OR", "NOT", "REM", "INPUT",
    "CLS", "COLOR", "LED", "MOVE", "SET", "SLEEP", "RUN", "LIST", "NEW", "LOAD", "SAVE", "DIR",
    "DEL", "HELP", "MEM", "INFO",
];

fn is_reserved(word: &str) -> bool {
    let word = word.trim_end_matches('$');
    RESERVED.contains(&word)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Relation {
    pub fn holds_for_numbers(self, lhs: f64, rhs: f64) -> bool {
        use Relation::*;
        match self {
            Equal => lhs == rhs,
            NotEqual => lhs != rhs,
            Less => lhs < rhs,
            LessEqual => lhs <= rhs,
            Greater => lhs > rhs,
            GreaterEqual => lhs >= rhs,
        }
    }

    pub fn holds_for_text(self, lhs: &str, rhs: &str) -> bool {
        use Relation::*;
        match self {
            Equal => lhs == rhs,
            NotEqual => lhs != rhs,
            Less => lhs < rhs,
            LessEqual => lhs <= rhs,
            Greater => lhs > rhs,
            GreaterEqual => lhs >= rhs,
        }
    }
}

/// Read head over one line of statement text.
///
/// Every `match_*` is test-and-consume: on success the cursor moves past
/// the whole token, on failure it does not move at all. Leading blanks
/// are skipped before every attempt.
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Cursor<'a> {
        Cursor { text, pos: 0 }
    }

    pub fn with_pos(text: &'a str, pos: usize) -> Cursor<'a> {
        debug_assert!(pos <= text.len());
        Cursor { text, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewind or fast-forward to a position previously obtained from
    /// `pos()`. Backtracking across whole tokens only.
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.text.is_char_boundary(pos));
        self.pos = pos;
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    pub fn match_eol(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.text.len()
    }

    pub fn match_literal(&mut self, lit: &str) -> bool {
        self.skip_whitespace();
        if self.text[self.pos..].starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Identifier-shaped token: a letter, then letters and digits, then
    /// an optional `$`. Uppercased. Reserved words are matched too; the
    /// varname matchers reject them.
    pub fn match_word(&mut self) -> Option<Rc<str>> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => self.advance_char(),
            _ => return None,
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() {
                self.advance_char();
            } else {
                break;
            }
        }
        if self.peek() == Some('$') {
            self.advance_char();
        }
        Some(self.text[start..self.pos].to_ascii_uppercase().into())
    }

    pub fn match_keyword(&mut self, kw: &str) -> bool {
        let start = self.pos;
        if let Some(word) = self.match_word() {
            if &*word == kw {
                return true;
            }
        }
        self.pos = start;
        false
    }

    pub fn match_number(&mut self) -> Option<f64> {
        self.skip_whitespace();
        let start = self.pos;
        if let Some('+') | Some('-') = self.peek() {
            self.advance_char();
        }
        let mut digits = 0;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance_char();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            self.advance_char();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    digits += 1;
                    self.advance_char();
                } else {
                    break;
                }
            }
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        match self.text[start..self.pos].parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Unsigned integer in line-number range. Used for line entry, LIST
    /// ranges, and GOTO/GOSUB targets.
    pub fn match_line_number(&mut self) -> Option<u16> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
        if start == self.pos {
            return None;
        }
        match self.text[start..self.pos].parse::<u32>() {
            Ok(n) if n <= LineNumber::max_value() as u32 => Some(n as u16),
            _ => {
                self.pos = start;
                None
            }
        }
    }

    /// Double-quoted literal, no escapes. An unterminated literal does
    /// not match; the stray quote then fails whatever production follows.
    pub fn match_string(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek() != Some('"') {
            return None;
        }
        self.advance_char();
        let mut s = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance_char();
                    return Some(s);
                }
                Some(ch) => {
                    s.push(ch);
                    self.advance_char();
                }
                None => {
                    self.pos = start;
                    return None;
                }
            }
        }
    }

    pub fn match_numeric_varname(&mut self) -> Option<Rc<str>> {
        let start = self.pos;
        let word = self.match_word()?;
        if word.ends_with('$') || is_reserved(&word) {
            self.pos = start;
            return None;
        }
        Some(word)
    }

    pub fn match_text_varname(&mut self) -> Option<Rc<str>> {
        let start = self.pos;
        let word = self.match_word()?;
        if !word.ends_with('$') || is_reserved(&word) {
            self.pos = start;
            return None;
        }
        Some(word)
    }

    pub fn match_relation(&mut self) -> Option<Relation> {
        use Relation::*;
        let table: &[(&str, Relation)] = &[
            ("<>", NotEqual),
            ("<=", LessEqual),
            (">=", GreaterEqual),
            ("=", Equal),
            ("<", Less),
            (">", Greater),
        ];
        for (lit, rel) in table {
            if self.match_literal(lit) {
                return Some(*rel);
            }
        }
        None
    }

    /// Consume up to (not including) `stop` or the end of line,
    /// returning the text with surrounding blanks trimmed. Used for
    /// unquoted INPUT replies.
    pub fn take_until(&mut self, stop: char) -> &'a str {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == stop {
                break;
            }
            self.advance_char();
        }
        self.text[start..self.pos].trim_end()
    }

    pub fn seek_eol(&mut self) {
        self.pos = self.text.len();
    }

    /// Skip a statement sequence up to an ELSE at this nesting depth.
    /// String literals are skipped whole; each inner IF consumes one
    /// following ELSE. Returns true with the cursor just past the ELSE,
    /// or false at end of line.
    pub fn seek_else(&mut self) -> bool {
        let mut depth = 0;
        loop {
            self.skip_whitespace();
            if self.match_eol() {
                return false;
            }
            if self.match_string().is_some() {
                continue;
            }
            if self.match_literal("'") {
                self.seek_eol();
                return false;
            }
            if let Some(word) = self.match_word() {
                match &*word {
                    "IF" => depth += 1,
                    "REM" => {
                        self.seek_eol();
                        return false;
                    }
                    "ELSE" => {
                        if depth == 0 {
                            return true;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
                continue;
            }
            self.advance_char();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_boundary() {
        let mut c = Cursor::new("printx=1");
        assert!(!c.match_keyword("PRINT"));
        assert_eq!(c.pos(), 0);
        let mut c = Cursor::new("  print \"hi\"");
        assert!(c.match_keyword("PRINT"));
        assert_eq!(c.match_string().as_deref(), Some("hi"));
        assert!(c.match_eol());
    }

    #[test]
    fn test_number_forms() {
        for (text, expect) in &[("42", 42.0), ("3.5", 3.5), (".5", 0.5), ("3.", 3.0), ("-2.25", -2.25), ("+7", 7.0)] {
            let mut c = Cursor::new(text);
            assert_eq!(c.match_number(), Some(*expect), "{}", text);
            assert!(c.match_eol());
        }
        let mut c = Cursor::new("-x");
        assert_eq!(c.match_number(), None);
        assert_eq!(c.pos(), 0);
        let mut c = Cursor::new(".");
        assert_eq!(c.match_number(), None);
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_unterminated_string_restores() {
        let mut c = Cursor::new("\"oops");
        assert_eq!(c.match_string(), None);
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_varname_kinds() {
        let mut c = Cursor::new("msg$");
        assert_eq!(c.match_numeric_varname(), None);
        assert_eq!(c.match_text_varname().as_deref(), Some("MSG$"));
        let mut c = Cursor::new("count2 ");
        assert_eq!(c.match_text_varname(), None);
        assert_eq!(c.match_numeric_varname().as_deref(), Some("COUNT2"));
        assert!(c.match_eol());
    }

    #[test]
    fn test_reserved_words_are_not_varnames() {
        for word in &["for", "TO", "Print", "led$"] {
            let mut c = Cursor::new(word);
            assert_eq!(c.match_numeric_varname(), None, "{}", word);
            assert_eq!(c.match_text_varname(), None, "{}", word);
            assert_eq!(c.pos(), 0);
        }
    }

    #[test]
    fn test_relation_longest_first() {
        let mut c = Cursor::new("<=1");
        assert_eq!(c.match_relation(), Some(Relation::LessEqual));
        assert_eq!(c.match_number(), Some(1.0));
        let mut c = Cursor::new("<>");
        assert_eq!(c.match_relation(), Some(Relation::NotEqual));
    }

    #[test]
    fn test_line_number_range() {
        let mut c = Cursor::new("65529 END");
        assert_eq!(c.match_line_number(), Some(65529));
        let mut c = Cursor::new("65530 END");
        assert_eq!(c.match_line_number(), None);
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_seek_else_skips_strings_and_nested_ifs() {
        let mut c = Cursor::new(r#"print "else" else print 2"#);
        assert!(c.seek_else());
        // consequent of a skipped outer IF holding a whole inner IF/ELSE
        let mut c2 = Cursor::new(r#"if 1 then print 1 else print 2 else print 3"#);
        assert!(c2.seek_else());
        assert!(c2.match_keyword("PRINT"));
        assert_eq!(c2.match_number(), Some(3.0));
        let mut c3 = Cursor::new(r#"print 1 rem else print 2"#);
        assert!(!c3.seek_else());
    }

    #[test]
    fn test_whitespace_skip_is_idempotent() {
        let mut c = Cursor::new("   a");
        c.skip_whitespace();
        let p = c.pos();
        c.skip_whitespace();
        assert_eq!(c.pos(), p);
    }
}
