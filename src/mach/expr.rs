use super::{Function, Val, Var, MAX_EXPR_DEPTH};
use crate::error;
use crate::lang::{Cursor, Error};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Expression evaluator
///
/// Recursive descent straight off the cursor text; values come out as
/// they are parsed. The cascade, lowest binding first: disjunction,
/// conjunction, negation, comparison, term, factor, value. Text
/// expressions live on a separate path and meet numbers only at
/// comparisons and PRINT items; mixing kinds is a type error, never a
/// coercion.
pub struct Eval<'e, 'c> {
    cursor: &'e mut Cursor<'c>,
    vars: &'e Var,
    functions: &'e mut Function,
    depth: usize,
}

impl<'e, 'c> Eval<'e, 'c> {
    pub fn new(cursor: &'e mut Cursor<'c>, vars: &'e Var, functions: &'e mut Function) -> Eval<'e, 'c> {
        Eval {
            cursor,
            vars,
            functions,
            depth: 0,
        }
    }

    /// True when the next token starts a text atom. Does not consume.
    pub fn at_text(&mut self) -> bool {
        let start = self.cursor.pos();
        if self.cursor.match_string().is_some() || self.cursor.match_text_varname().is_some() {
            self.cursor.set_pos(start);
            return true;
        }
        false
    }

    pub fn expression(&mut self) -> Result<f64> {
        self.enter()?;
        let result = self.disjunction();
        self.leave();
        result
    }

    pub fn text_expression(&mut self) -> Result<Rc<str>> {
        let mut s = self.text_atom()?.to_string();
        loop {
            let start = self.cursor.pos();
            if !self.cursor.match_literal("+") {
                return Ok(s.into());
            }
            if !self.at_text() {
                self.cursor.set_pos(start);
                return Err(error!(TypeMismatch));
            }
            s.push_str(&self.text_atom()?);
        }
    }

    fn text_atom(&mut self) -> Result<Rc<str>> {
        if let Some(s) = self.cursor.match_string() {
            return Ok(s.into());
        }
        if let Some(name) = self.cursor.match_text_varname() {
            return match self.vars.fetch(&name) {
                Val::Text(s) => Ok(s),
                Val::Number(_) => Err(error!(InternalError; "TEXT NAME HELD A NUMBER")),
            };
        }
        Err(error!(SyntaxError; "EXPECTED TEXT EXPRESSION"))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            Err(error!(FormulaTooComplex))
        } else {
            Ok(())
        }
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn check(n: f64) -> Result<f64> {
        if n.is_finite() {
            Ok(n)
        } else {
            Err(error!(Overflow))
        }
    }

    fn disjunction(&mut self) -> Result<f64> {
        let mut lhs = self.conjunction()?;
        while self.cursor.match_keyword("OR") {
            let rhs = self.conjunction()?;
            lhs = if lhs != 0.0 || rhs != 0.0 { 1.0 } else { 0.0 };
        }
        Ok(lhs)
    }

    fn conjunction(&mut self) -> Result<f64> {
        let mut lhs = self.negation()?;
        while self.cursor.match_keyword("AND") {
            let rhs = self.negation()?;
            lhs = if lhs != 0.0 && rhs != 0.0 { 1.0 } else { 0.0 };
        }
        Ok(lhs)
    }

    fn negation(&mut self) -> Result<f64> {
        if self.cursor.match_keyword("NOT") {
            let val = self.comparison()?;
            return Ok(if val == 0.0 { 1.0 } else { 0.0 });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<f64> {
        if self.at_text() {
            let lhs = self.text_expression()?;
            let rel = match self.cursor.match_relation() {
                Some(rel) => rel,
                None => return Err(error!(SyntaxError; "EXPECTED RELATION")),
            };
            if !self.at_text() {
                return Err(error!(TypeMismatch));
            }
            let rhs = self.text_expression()?;
            return Ok(if rel.holds_for_text(&lhs, &rhs) { 1.0 } else { 0.0 });
        }
        let lhs = self.term()?;
        if let Some(rel) = self.cursor.match_relation() {
            if self.at_text() {
                return Err(error!(TypeMismatch));
            }
            let rhs = self.term()?;
            return Ok(if rel.holds_for_numbers(lhs, rhs) { 1.0 } else { 0.0 });
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<f64> {
        let mut lhs = self.factor()?;
        loop {
            if self.cursor.match_literal("+") {
                lhs = Self::check(lhs + self.factor()?)?;
            } else if self.cursor.match_literal("-") {
                lhs = Self::check(lhs - self.factor()?)?;
            } else {
                return Ok(lhs);
            }
        }
    }

    fn factor(&mut self) -> Result<f64> {
        let mut lhs = self.value()?;
        loop {
            if self.cursor.match_literal("*") {
                lhs = Self::check(lhs * self.value()?)?;
            } else if self.cursor.match_literal("/") {
                let rhs = self.value()?;
                if rhs == 0.0 {
                    return Err(error!(DivisionByZero));
                }
                lhs = Self::check(lhs / rhs)?;
            } else {
                return Ok(lhs);
            }
        }
    }

    fn value(&mut self) -> Result<f64> {
        self.enter()?;
        let result = self.value_inner();
        self.leave();
        result
    }

    fn value_inner(&mut self) -> Result<f64> {
        if let Some(n) = self.cursor.match_number() {
            return Ok(n);
        }
        if self.cursor.match_literal("(") {
            let val = self.expression()?;
            if !self.cursor.match_literal(")") {
                return Err(error!(SyntaxError; "EXPECTED )"));
            }
            return Ok(val);
        }
        if self.cursor.match_literal("-") {
            return Ok(-self.value()?);
        }
        if let Some(name) = self.cursor.match_numeric_varname() {
            if self.cursor.match_literal("(") {
                let args = self.args()?;
                return self.functions.call(&name, &args);
            }
            return match self.vars.fetch(&name) {
                Val::Number(n) => Ok(n),
                Val::Text(_) => Err(error!(InternalError; "NUMERIC NAME HELD TEXT")),
            };
        }
        if self.at_text() {
            return Err(error!(TypeMismatch));
        }
        Err(error!(SyntaxError; "EXPECTED EXPRESSION"))
    }

    /// Comma-separated argument list; the opening paren is already
    /// consumed, this eats the closing one.
    fn args(&mut self) -> Result<Vec<f64>> {
        let mut args = vec![];
        if self.cursor.match_literal(")") {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.cursor.match_literal(",") {
                continue;
            }
            if self.cursor.match_literal(")") {
                return Ok(args);
            }
            return Err(error!(SyntaxError; "EXPECTED )"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> Result<f64> {
        let vars = Var::new();
        let mut functions = Function::new();
        let mut cursor = Cursor::new(text);
        let result = Eval::new(&mut cursor, &vars, &mut functions).expression();
        if result.is_ok() {
            assert!(cursor.match_eol(), "unconsumed input in {:?}", text);
        }
        result
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2+3*4").unwrap(), 14.0);
        assert_eq!(eval("(2+3)*4").unwrap(), 20.0);
        assert_eq!(eval("10-2-3").unwrap(), 5.0);
        assert_eq!(eval("1.5/2*3").unwrap(), 2.25);
    }

    #[test]
    fn test_comparisons_yield_unit_values() {
        assert_eq!(eval("1<2").unwrap(), 1.0);
        assert_eq!(eval("2<=1").unwrap(), 0.0);
        assert_eq!(eval("3<>3").unwrap(), 0.0);
        assert_eq!(eval("1<2 AND 3>2").unwrap(), 1.0);
        assert_eq!(eval("1>2 OR 0").unwrap(), 0.0);
        assert_eq!(eval("NOT 0").unwrap(), 1.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-(2+3)").unwrap(), -5.0);
        assert_eq!(eval("2--3").unwrap(), 5.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0").unwrap_err().code(), 11);
    }

    #[test]
    fn test_text_comparison() {
        let vars = Var::new();
        let mut functions = Function::new();
        let mut cursor = Cursor::new("\"ABC\" < \"ABD\"");
        let n = Eval::new(&mut cursor, &vars, &mut functions)
            .expression()
            .unwrap();
        assert_eq!(n, 1.0);
    }

    #[test]
    fn test_mixed_kinds_are_an_error() {
        assert_eq!(eval("\"A\" = 1").unwrap_err().code(), 13);
        assert_eq!(eval("1 + \"A\"").unwrap_err().code(), 13);
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(eval("ABS(-5)").unwrap(), 5.0);
        assert_eq!(eval("MAX(2, 3*4)").unwrap(), 12.0);
        assert_eq!(eval("INT(2.9)+1").unwrap(), 3.0);
        assert_eq!(eval("NOPE(1)").unwrap_err().code(), 18);
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut deep = String::new();
        for _ in 0..100 {
            deep.push('(');
        }
        deep.push('1');
        for _ in 0..100 {
            deep.push(')');
        }
        assert_eq!(eval(&deep).unwrap_err().code(), 16);
    }

    #[test]
    fn test_variables_resolve() {
        let mut vars = Var::new();
        vars.store(&"X".into(), Val::Number(6.0)).unwrap();
        let mut functions = Function::new();
        let mut cursor = Cursor::new("x*7");
        let n = Eval::new(&mut cursor, &vars, &mut functions)
            .expression()
            .unwrap();
        assert_eq!(n, 42.0);
    }

    #[test]
    fn test_text_concatenation() {
        let mut vars = Var::new();
        vars.store(&"A$".into(), Val::Text("BADGE".into())).unwrap();
        let mut functions = Function::new();
        let mut cursor = Cursor::new("a$ + \" \" + \"BASIC\"");
        let s = Eval::new(&mut cursor, &vars, &mut functions)
            .text_expression()
            .unwrap();
        assert_eq!(&*s, "BADGE BASIC");
    }
}
