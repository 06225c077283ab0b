//! Direct interpreter
//!
//! Executes statements straight off the materialized token buffer; no
//! syntax tree is built. The single carrier of "where execution is" is
//! an integer cursor into the buffer: loops and gotos are realized by
//! reassigning it. Skipped branches (a false IF or WHILE condition)
//! are scanned token-by-token for the terminating keyword without
//! grammar checking.
//!
//! Label and goto validation is incremental: a LABEL records its own
//! token index on first encounter, and every GOTO must resolve against
//! the labels recorded so far. Forward jumps therefore fail here even
//! though the C backend's deferred check accepts them.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// The interpreting grammar walk.
///
/// Generic over the INPUT source and the PRINT sink so tests can run
/// against in-memory buffers; the CLI passes stdin and stdout.
pub struct Interpreter<R, W> {
    tokens: Vec<Token>,
    cursor: usize,
    symbols: HashMap<String, f64>,
    /// Label name to the index of its LABEL token
    labels: HashMap<String, usize>,
    labels_gotoed: HashSet<String>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    /// Create an interpreter over a tokenized program.
    /// `tokens` must end with the EOF token `Lexer::tokenize` produces.
    pub fn new(tokens: Vec<Token>, input: R, output: W) -> Self {
        Self {
            tokens,
            cursor: 0,
            symbols: HashMap::new(),
            labels: HashMap::new(),
            labels_gotoed: HashSet::new(),
            input,
            output,
        }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // The buffer always ends with EOF; clamp rather than run past it.
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if !self.check(kind) {
            return Err(Error::UnexpectedToken {
                expected: kind.to_string(),
                got: self.current().kind.to_string(),
                line: self.current().line,
            });
        }
        self.advance();
        Ok(())
    }

    // ==================== Execution ====================

    /// program := {NEWLINE} {statement}
    pub fn run(&mut self) -> Result<()> {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
        while !self.check(TokenKind::Eof) {
            self.statement()?;
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<()> {
        match self.current().kind {
            TokenKind::Print => {
                self.advance();
                if self.check(TokenKind::Str) {
                    let text = self.current().text.clone();
                    writeln!(self.output, "{text}")?;
                    self.advance();
                } else {
                    let value = self.expression()?;
                    writeln!(self.output, "{value}")?;
                }
            }
            TokenKind::If => self.if_statement()?,
            TokenKind::While => self.while_statement()?,
            TokenKind::Label => {
                let label_pos = self.cursor;
                self.advance();
                if self.check(TokenKind::Ident) {
                    let name = self.current().text.clone();
                    match self.labels.get(&name) {
                        // Re-entering the same declaration (via a loop
                        // or a jump back) is not a redeclaration.
                        Some(&pos) if pos != label_pos => {
                            return Err(Error::DuplicateLabel {
                                name,
                                line: self.current().line,
                            });
                        }
                        _ => {
                            self.labels.insert(name, label_pos);
                        }
                    }
                }
                self.expect(TokenKind::Ident)?;
            }
            TokenKind::Let => {
                self.advance();
                if !self.check(TokenKind::Ident) {
                    return Err(Error::UnexpectedToken {
                        expected: TokenKind::Ident.to_string(),
                        got: self.current().kind.to_string(),
                        line: self.current().line,
                    });
                }
                let name = self.current().text.clone();
                // Declared before the right-hand side is evaluated, so
                // `LET a = a` assigns 0 rather than failing.
                self.symbols.entry(name.clone()).or_insert(0.0);
                self.advance();
                self.expect(TokenKind::Eq)?;
                let value = self.expression()?;
                self.symbols.insert(name, value);
            }
            TokenKind::Input => {
                self.advance();
                if self.check(TokenKind::Ident) {
                    let name = self.current().text.clone();
                    let value = self.read_input()?;
                    self.symbols.insert(name, value);
                }
                self.expect(TokenKind::Ident)?;
            }
            // Handled by the interception below.
            TokenKind::Goto => {}
            _ => {
                return Err(Error::InvalidStatement {
                    text: self.current().text.clone(),
                    line: self.current().line,
                })
            }
        }

        // GOTO interception: a GOTO left at the cursor (either in plain
        // statement position or by a block body breaking out) jumps now,
        // without consuming a trailing newline - the cursor lands on the
        // target LABEL token and the next dispatch re-parses it.
        if self.check(TokenKind::Goto) {
            return self.goto_jump();
        }

        self.newline()
    }

    /// Consume a GOTO and reposition the cursor at its target LABEL
    fn goto_jump(&mut self) -> Result<()> {
        self.expect(TokenKind::Goto)?;
        if !self.check(TokenKind::Ident) {
            return Err(Error::UnexpectedToken {
                expected: TokenKind::Ident.to_string(),
                got: self.current().kind.to_string(),
                line: self.current().line,
            });
        }

        let name = self.current().text.clone();
        let line = self.current().line;
        self.labels_gotoed.insert(name.clone());
        match self.labels.get(&name) {
            Some(&pos) => {
                log::trace!("goto {name} -> token {pos}");
                self.cursor = pos;
                Ok(())
            }
            None => Err(Error::UndeclaredLabel { name, line }),
        }
    }

    /// IF comparison THEN newline {statement} ENDIF
    ///
    /// The comparison is evaluated once. A false branch is skipped one
    /// token at a time, matching the terminator textually rather than
    /// structurally.
    fn if_statement(&mut self) -> Result<()> {
        self.advance();
        let condition = self.comparison()?;
        self.expect(TokenKind::Then)?;
        self.newline()?;

        if condition {
            loop {
                if self.check(TokenKind::EndIf) || self.check(TokenKind::Goto) {
                    break;
                }
                self.statement()?;
            }
        } else {
            while !self.check(TokenKind::EndIf) && !self.check(TokenKind::Eof) {
                self.advance();
            }
        }

        // A GOTO exits the block without consuming its ENDIF; the
        // interception in statement() performs the jump.
        if !self.check(TokenKind::Goto) {
            self.expect(TokenKind::EndIf)?;
        }
        Ok(())
    }

    /// WHILE comparison REPEAT newline {statement} ENDWHILE
    ///
    /// The cursor position of the WHILE token is remembered; finishing
    /// an iteration resets the cursor there to re-evaluate the
    /// condition.
    fn while_statement(&mut self) -> Result<()> {
        let while_pos = self.cursor;
        loop {
            self.advance();
            let condition = self.comparison()?;
            self.expect(TokenKind::Repeat)?;
            self.newline()?;

            if condition {
                loop {
                    if self.check(TokenKind::EndWhile) || self.check(TokenKind::Goto) {
                        break;
                    }
                    self.statement()?;
                }
                if self.check(TokenKind::Goto) {
                    // Abandon the loop; the interception jumps.
                    return Ok(());
                }
                self.expect(TokenKind::EndWhile)?;
                self.cursor = while_pos;
            } else {
                while !self.check(TokenKind::EndWhile) && !self.check(TokenKind::Eof) {
                    self.advance();
                }
                self.expect(TokenKind::EndWhile)?;
                return Ok(());
            }
        }
    }

    // ==================== Expression Evaluation ====================

    /// comparison := expression compOp expression {compOp expression}
    ///
    /// Strict and eager, no short-circuiting. Chains fold left with the
    /// running left operand becoming 1.0 or 0.0 after each operator,
    /// matching the C the generator emits (`a < b < c` is `(a<b) < c`).
    fn comparison(&mut self) -> Result<bool> {
        let mut left = self.expression()?;

        if !self.current().kind.is_comparison_operator() {
            return Err(Error::ExpectedComparisonOperator {
                text: self.current().text.clone(),
                line: self.current().line,
            });
        }

        let mut truth = false;
        while self.current().kind.is_comparison_operator() {
            let op = self.current().kind;
            self.advance();
            let right = self.expression()?;
            truth = match op {
                TokenKind::EqEq => left == right,
                TokenKind::NotEq => left != right,
                TokenKind::Lt => left < right,
                TokenKind::LtEq => left <= right,
                TokenKind::Gt => left > right,
                TokenKind::GtEq => left >= right,
                _ => unreachable!("is_comparison_operator covers all arms"),
            };
            left = if truth { 1.0 } else { 0.0 };
        }
        Ok(truth)
    }

    /// expression := term {(+|-) term}
    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.current().kind {
                TokenKind::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                TokenKind::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// term := unary {(*|/) unary}
    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            match self.current().kind {
                TokenKind::Asterisk => {
                    self.advance();
                    value *= self.unary()?;
                }
                TokenKind::Slash => {
                    // Division by zero follows IEEE float semantics.
                    self.advance();
                    value /= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// unary := [+|-] primary
    fn unary(&mut self) -> Result<f64> {
        match self.current().kind {
            TokenKind::Minus => {
                self.advance();
                Ok(-self.primary()?)
            }
            TokenKind::Plus => {
                self.advance();
                self.primary()
            }
            _ => self.primary(),
        }
    }

    /// primary := NUMBER | IDENTIFIER
    fn primary(&mut self) -> Result<f64> {
        match self.current().kind {
            TokenKind::Number => {
                let value = self.current().value;
                self.advance();
                Ok(value)
            }
            TokenKind::Ident => {
                let name = self.current().text.clone();
                match self.symbols.get(&name) {
                    Some(&value) => {
                        self.advance();
                        Ok(value)
                    }
                    None => Err(Error::UndeclaredVariable {
                        name,
                        line: self.current().line,
                    }),
                }
            }
            _ => Err(Error::UnexpectedPrimary {
                text: self.current().text.clone(),
                line: self.current().line,
            }),
        }
    }

    // ==================== External Input ====================

    /// Read one line of numeric input; any parse failure (including an
    /// empty line) yields zero, never an error.
    fn read_input(&mut self) -> Result<f64> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().parse().unwrap_or(0.0))
    }

    /// newline := NEWLINE {NEWLINE}
    fn newline(&mut self) -> Result<()> {
        self.expect(TokenKind::Newline)?;
        while self.check(TokenKind::Newline) {
            self.advance();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn run_with_input(source: &str, input: &str) -> Result<String> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut output = Vec::new();
        Interpreter::new(tokens, Cursor::new(input.to_string()), &mut output).run()?;
        Ok(String::from_utf8(output).unwrap())
    }

    fn run(source: &str) -> Result<String> {
        run_with_input(source, "")
    }

    #[test]
    fn test_let_and_print() {
        assert_eq!(run("LET a = 3\nPRINT a\n").unwrap(), "3\n");
    }

    #[test]
    fn test_print_string() {
        assert_eq!(run("PRINT \"hello, world\"\n").unwrap(), "hello, world\n");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("PRINT 1 + 2 * 3\n").unwrap(), "7\n");
        assert_eq!(run("PRINT 10 - 2 - 3\n").unwrap(), "5\n");
        assert_eq!(run("PRINT -2 + 7\n").unwrap(), "5\n");
        assert_eq!(run("PRINT 7 / 2\n").unwrap(), "3.5\n");
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(run("PRINT 1 / 0\n").unwrap(), "inf\n");
    }

    #[test]
    fn test_undeclared_variable() {
        assert!(matches!(
            run("PRINT x\n"),
            Err(Error::UndeclaredVariable { name, line: 1 }) if name == "x"
        ));
    }

    #[test]
    fn test_let_declares_before_evaluating() {
        // The name enters the symbol table, at zero, before the
        // right-hand side runs.
        assert_eq!(run("LET a = a + 1\nPRINT a\n").unwrap(), "1\n");
    }

    #[test]
    fn test_if_true_and_false() {
        let source = "LET a = 1\nIF a == 1 THEN\nPRINT \"yes\"\nENDIF\n\
                      IF a == 2 THEN\nPRINT \"no\"\nENDIF\nPRINT \"done\"\n";
        assert_eq!(run(source).unwrap(), "yes\ndone\n");
    }

    #[test]
    fn test_comparison_chain() {
        // 1 < 2 is 1.0, then 1 == 1 holds.
        assert_eq!(
            run("IF 1 < 2 == 1 THEN\nPRINT \"t\"\nENDIF\n").unwrap(),
            "t\n"
        );
        // 5 > 3 is 1.0, and 1 > 2 fails.
        assert_eq!(
            run("IF 5 > 3 > 2 THEN\nPRINT \"t\"\nENDIF\nPRINT \"end\"\n").unwrap(),
            "end\n"
        );
    }

    #[test]
    fn test_comparison_operator_is_mandatory() {
        assert!(matches!(
            run("IF 1 THEN\nENDIF\n"),
            Err(Error::ExpectedComparisonOperator { .. })
        ));
    }

    #[test]
    fn test_counting_loop() {
        let source = "LET i = 0\nWHILE i < 5 REPEAT\nPRINT i\nLET i = i + 1\nENDWHILE\nPRINT i\n";
        assert_eq!(run(source).unwrap(), "0\n1\n2\n3\n4\n5\n");
    }

    #[test]
    fn test_rerun_from_fresh_cursor_is_identical() {
        let source = "LET i = 0\nWHILE i < 5 REPEAT\nPRINT i\nLET i = i + 1\nENDWHILE\n";
        let tokens = Lexer::new(source).tokenize().unwrap();

        let mut first = Vec::new();
        Interpreter::new(tokens.clone(), Cursor::new(String::new()), &mut first)
            .run()
            .unwrap();
        let mut second = Vec::new();
        Interpreter::new(tokens, Cursor::new(String::new()), &mut second)
            .run()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_goto_inside_if() {
        let source = "LET i = 0\nLABEL top\nPRINT i\nLET i = i + 1\n\
                      IF i < 3 THEN\nGOTO top\nENDIF\nPRINT \"done\"\n";
        assert_eq!(run(source).unwrap(), "0\n1\n2\ndone\n");
    }

    #[test]
    fn test_top_level_goto() {
        let source = "LET n = 2\nLABEL again\nPRINT n\nLET n = n - 1\n\
                      WHILE n > 0 REPEAT\nGOTO again\nENDWHILE\n";
        assert_eq!(run(source).unwrap(), "2\n1\n");
    }

    #[test]
    fn test_duplicate_label() {
        assert!(matches!(
            run("LABEL loop\nLABEL loop\n"),
            Err(Error::DuplicateLabel { name, .. }) if name == "loop"
        ));
    }

    #[test]
    fn test_goto_undeclared_label() {
        assert!(matches!(
            run("LABEL a\nGOTO missing\n"),
            Err(Error::UndeclaredLabel { name, .. }) if name == "missing"
        ));
    }

    #[test]
    fn test_label_reentry_is_not_a_redeclaration() {
        let source = "LET i = 0\nLABEL top\nLET i = i + 1\n\
                      IF i < 2 THEN\nGOTO top\nENDIF\nPRINT i\n";
        assert_eq!(run(source).unwrap(), "2\n");
    }

    #[test]
    fn test_input_reads_a_number() {
        assert_eq!(
            run_with_input("INPUT n\nPRINT n + 1\n", "41\n").unwrap(),
            "42\n"
        );
    }

    #[test]
    fn test_input_parse_failure_yields_zero() {
        assert_eq!(
            run_with_input("INPUT n\nPRINT n\n", "not a number\n").unwrap(),
            "0\n"
        );
        assert_eq!(run_with_input("INPUT n\nPRINT n\n", "\n").unwrap(), "0\n");
    }

    #[test]
    fn test_false_branch_is_not_grammar_checked() {
        // The skipped branch contains an invalid statement; skipping is
        // a raw token scan, so it never notices.
        let source = "IF 1 == 2 THEN\nTHEN THEN THEN\nENDIF\nPRINT \"ok\"\n";
        assert_eq!(run(source).unwrap(), "ok\n");
    }

    #[test]
    fn test_unclosed_if_reports_missing_endif() {
        assert!(matches!(
            run("IF 1 == 2 THEN\nPRINT 1\n"),
            Err(Error::UnexpectedToken { expected, .. }) if expected == "ENDIF"
        ));
    }

    #[test]
    fn test_same_grammar_as_the_c_backend() {
        use crate::backend::CCodeGen;

        let source = "LET total = 0\nLET i = 1\nWHILE i <= 3 REPEAT\n\
                      LET total = total + i\nLET i = i + 1\nENDWHILE\n\
                      IF total == 6 THEN\nPRINT \"six\"\nENDIF\n";
        assert!(CCodeGen::new(Lexer::new(source)).unwrap().generate().is_ok());
        assert_eq!(run(source).unwrap(), "six\n");
    }

    #[test]
    fn test_invalid_statement() {
        assert!(matches!(
            run("ENDWHILE\n"),
            Err(Error::InvalidStatement { .. })
        ));
    }
}
